use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "publicASN")]
    pub public_asn: u32,
    #[serde(default)]
    pub physical_instance_asn: u32,
    #[serde(default, rename = "virtualInstanceASN")]
    pub virtual_instance_asn: u32,
    #[serde(default, rename = "routingProfilID", alias = "routingProfileID")]
    pub routing_profile_id: u32,
    #[serde(default)]
    pub vpn: String,
    #[serde(default, rename = "aclPolicy")]
    pub acl_policy: String,
}

/// Shared by add and update; the controller ignores a zero `id` on add.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteAdd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    #[serde(rename = "publicASN")]
    pub public_asn: u32,
    pub physical_instance_asn: u32,
    #[serde(rename = "virtualInstanceASN")]
    pub virtual_instance_asn: u32,
    pub vpn: String,
    #[serde(rename = "aclPolicy")]
    pub acl_policy: String,
    #[serde(rename = "routingProfileID")]
    pub routing_profile_id: u32,
}

impl Client {
    pub async fn list_sites(&self) -> Result<Vec<Site>, ApiError> {
        self.list("/api/v2/sites").await
    }

    pub async fn add_site(&self, site: &SiteAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/sites", site).await
    }

    pub async fn update_site(&self, site: &SiteAdd) -> Result<ApiResponse, ApiError> {
        self.put("/api/v2/sites", site).await
    }

    pub async fn delete_site(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/sites/{id}")).await
    }
}

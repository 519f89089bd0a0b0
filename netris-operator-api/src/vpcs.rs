use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub admin_tenant: IdName,
    #[serde(default, rename = "guestTenant")]
    pub guest_tenants: Vec<IdName>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VpcAdd {
    pub name: String,
    pub admin_tenant: IdName,
    #[serde(rename = "guestTenant")]
    pub guest_tenants: Vec<IdName>,
    pub tags: Vec<String>,
}

impl Client {
    pub async fn list_vpcs(&self) -> Result<Vec<Vpc>, ApiError> {
        self.list("/api/v2/vpc").await
    }

    pub async fn add_vpc(&self, vpc: &VpcAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/vpc", vpc).await
    }

    pub async fn update_vpc(&self, id: u32, vpc: &VpcAdd) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/vpc/{id}"), vpc).await
    }

    pub async fn delete_vpc(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/vpc/{id}")).await
    }
}

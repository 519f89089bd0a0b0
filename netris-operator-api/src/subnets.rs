use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub tenant: IdName,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub default_gateway: String,
    #[serde(default)]
    pub sites: Vec<IdName>,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAdd {
    pub name: String,
    pub prefix: String,
    pub tenant: IdName,
    pub purpose: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_gateway: String,
    pub sites: Vec<IdName>,
}

impl Client {
    pub async fn list_subnets(&self) -> Result<Vec<Subnet>, ApiError> {
        self.list("/api/v2/ipam/subnets").await
    }

    pub async fn add_subnet(&self, subnet: &SubnetAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/ipam/subnet", subnet).await
    }

    pub async fn update_subnet(&self, id: u32, subnet: &SubnetAdd) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/ipam/subnet/{id}"), subnet).await
    }

    pub async fn delete_subnet(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/ipam/subnet/{id}")).await
    }
}

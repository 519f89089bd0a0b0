use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub tenant: IdName,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AllocationAdd {
    pub name: String,
    pub prefix: String,
    pub tenant: IdName,
}

impl Client {
    pub async fn list_allocations(&self) -> Result<Vec<Allocation>, ApiError> {
        self.list("/api/v2/ipam/allocations").await
    }

    pub async fn add_allocation(&self, allocation: &AllocationAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/ipam/allocation", allocation).await
    }

    pub async fn update_allocation(
        &self,
        id: u32,
        allocation: &AllocationAdd,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/ipam/allocation/{id}"), allocation)
            .await
    }

    pub async fn delete_allocation(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/ipam/allocation/{id}")).await
    }
}

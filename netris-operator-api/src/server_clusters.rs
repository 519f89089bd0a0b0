use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerCluster {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub admin: IdName,
    #[serde(default)]
    pub site: IdName,
    #[serde(default)]
    pub vpc: IdName,
    #[serde(default, rename = "srvClusterTemplate")]
    pub template: IdName,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerClusterAdd {
    pub name: String,
    pub admin: IdName,
    pub site: IdName,
    pub vpc: IdName,
    #[serde(rename = "srvClusterTemplate")]
    pub template: IdName,
    pub tags: Vec<String>,
}

/// Updates may only touch the name and tags; placement is immutable.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerClusterUpdate {
    pub name: String,
    pub tags: Vec<String>,
}

impl Client {
    pub async fn list_server_clusters(&self) -> Result<Vec<ServerCluster>, ApiError> {
        self.list("/api/v2/servercluster").await
    }

    pub async fn add_server_cluster(
        &self,
        cluster: &ServerClusterAdd,
    ) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/servercluster", cluster).await
    }

    pub async fn update_server_cluster(
        &self,
        id: u32,
        cluster: &ServerClusterUpdate,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/servercluster/{id}"), cluster)
            .await
    }

    pub async fn delete_server_cluster(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/servercluster/{id}")).await
    }
}

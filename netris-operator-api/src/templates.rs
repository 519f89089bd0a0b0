use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse};

/// Server cluster template. The `vnets` payload is free-form and compared
/// structurally, so it stays a raw JSON value end to end.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTemplate {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vnets: serde_json::Value,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTemplateAdd {
    pub name: String,
    pub vnets: serde_json::Value,
}

impl Client {
    pub async fn list_cluster_templates(&self) -> Result<Vec<ClusterTemplate>, ApiError> {
        self.list("/api/v2/serverclustertemplate").await
    }

    pub async fn add_cluster_template(
        &self,
        template: &ClusterTemplateAdd,
    ) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/serverclustertemplate", template).await
    }

    pub async fn update_cluster_template(
        &self,
        id: u32,
        template: &ClusterTemplateAdd,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/serverclustertemplate/{id}"), template)
            .await
    }

    pub async fn delete_cluster_template(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/serverclustertemplate/{id}"))
            .await
    }
}

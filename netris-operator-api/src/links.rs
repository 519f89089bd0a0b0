use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

/// Links have no server-side ID; a link IS its port pair, and the delete
/// endpoint takes the same payload as add.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Link {
    #[serde(default)]
    pub local: IdName,
    #[serde(default)]
    pub remote: IdName,
}

impl Link {
    pub fn between(local: u32, remote: u32) -> Self {
        Self {
            local: IdName::id(local),
            remote: IdName::id(remote),
        }
    }
}

impl Client {
    pub async fn list_links(&self) -> Result<Vec<Link>, ApiError> {
        self.list("/api/v2/link").await
    }

    pub async fn add_link(&self, link: &Link) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/link", link).await
    }

    pub async fn delete_link(&self, link: &Link) -> Result<ApiResponse, ApiError> {
        self.delete_with_body("/api/v2/link", link).await
    }
}

use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError};

/// Network operating system entry. Referenced by tag from switch specs.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Nos {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
}

impl Client {
    pub async fn list_nos(&self) -> Result<Vec<Nos>, ApiError> {
        self.list("/api/v2/nos").await
    }
}

use serde::Deserialize;

use crate::{client::Client, error::ApiError};

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Tenant {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

impl Client {
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiError> {
        self.list("/api/v2/tenants").await
    }
}

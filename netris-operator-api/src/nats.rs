use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

/// State, action and protocol come back as `{label, value}` pairs.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct LabelValue {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Nat {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub state: LabelValue,
    #[serde(default)]
    pub site: IdName,
    #[serde(default)]
    pub action: LabelValue,
    #[serde(default)]
    pub protocol: LabelValue,
    #[serde(default)]
    pub source_address: String,
    #[serde(default)]
    pub source_port: String,
    #[serde(default)]
    pub destination_address: String,
    #[serde(default)]
    pub destination_port: String,
    #[serde(default, rename = "snatToIP")]
    pub snat_to_ip: String,
    #[serde(default)]
    pub snat_to_pool: String,
    #[serde(default, rename = "dnatToIP")]
    pub dnat_to_ip: String,
    #[serde(default)]
    pub dnat_to_port: u16,
    #[serde(default)]
    pub modified_date: u64,
}

#[serde_as]
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NatAdd {
    pub name: String,
    pub comment: String,
    pub state: String,
    pub site: IdName,
    pub action: String,
    pub protocol: String,
    pub source_address: String,
    pub source_port: String,
    pub destination_address: String,
    pub destination_port: String,
    #[serde(rename = "snatToIP")]
    pub snat_to_ip: String,
    pub snat_to_pool: String,
    #[serde(rename = "dnatToIP")]
    pub dnat_to_ip: String,
    #[serde_as(as = "DisplayFromStr")]
    pub dnat_to_port: u16,
}

impl Client {
    pub async fn list_nats(&self) -> Result<Vec<Nat>, ApiError> {
        self.list("/api/v2/nat").await
    }

    pub async fn add_nat(&self, nat: &NatAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/nat", nat).await
    }

    pub async fn update_nat(&self, id: u32, nat: &NatAdd) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/nat/{id}"), nat).await
    }

    pub async fn delete_nat(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/nat/{id}")).await
    }
}

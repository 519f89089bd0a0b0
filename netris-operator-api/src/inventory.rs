use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, nos::Nos, response::ApiResponse, IdName, NumberOrAuto};

/// One row of the hardware inventory. Switches, softgates, controllers and
/// servers share the listing; `hw_type` tells them apart.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HwItem {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub hw_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tenant: IdName,
    #[serde(default)]
    pub site: IdName,
    #[serde(default)]
    pub profile: IdName,
    #[serde(default)]
    pub asn: u32,
    #[serde(default, rename = "mainIp")]
    pub main_ip: Address,
    #[serde(default, rename = "mgmtIp")]
    pub mgmt_ip: Address,
    #[serde(default)]
    pub port_count: u32,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub nos: Nos,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub srv_role: String,
    #[serde(default)]
    pub custom_data: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<HwLink>,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Address {
    #[serde(default)]
    pub address: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct HwLink {
    #[serde(default)]
    pub local: IdName,
    #[serde(default)]
    pub remote: IdName,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SwitchAdd {
    #[serde(rename = "type")]
    pub hw_type: String,
    pub name: String,
    pub description: String,
    pub tenant: IdName,
    pub site: IdName,
    pub profile: IdName,
    pub asn: NumberOrAuto,
    pub nos: Nos,
    pub main_address: String,
    pub mgmt_address: String,
    pub port_count: u32,
    pub mac_address: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SoftgateAdd {
    #[serde(rename = "type")]
    pub hw_type: String,
    pub name: String,
    pub description: String,
    pub tenant: IdName,
    pub site: IdName,
    pub profile: IdName,
    pub main_address: String,
    pub mgmt_address: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ControllerAdd {
    #[serde(rename = "type")]
    pub hw_type: String,
    pub name: String,
    pub description: String,
    pub tenant: IdName,
    pub site: IdName,
    pub main_address: String,
}

/// Controllers can't move between tenants or sites, so updates carry less.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ControllerUpdate {
    pub name: String,
    pub description: String,
    pub main_address: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerAdd {
    #[serde(rename = "type")]
    pub hw_type: String,
    pub name: String,
    pub description: String,
    pub tenant: IdName,
    pub site: IdName,
    pub profile: IdName,
    pub asn: NumberOrAuto,
    pub main_address: String,
    pub mgmt_address: String,
    pub port_count: u32,
    pub uuid: String,
    pub custom_data: String,
    pub tags: Vec<String>,
    pub srv_role: String,
}

impl Client {
    pub async fn list_inventory(&self) -> Result<Vec<HwItem>, ApiError> {
        self.list("/api/v2/inventory").await
    }

    pub async fn add_inventory<B: Serialize>(&self, item: &B) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/inventory", item).await
    }

    pub async fn update_inventory<B: Serialize>(
        &self,
        id: u32,
        item: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/inventory/{id}"), item).await
    }

    /// The endpoint needs to know what it is deleting to cascade correctly.
    pub async fn delete_inventory(&self, hw_type: &str, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/inventory/{id}?type={hw_type}"))
            .await
    }
}

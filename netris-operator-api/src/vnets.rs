use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse, IdName};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNet {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tenant: IdName,
    #[serde(default)]
    pub guest_tenants: Vec<IdName>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub sites: Vec<IdName>,
    #[serde(default)]
    pub gateways: Vec<VNetGateway>,
    #[serde(default)]
    pub ports: Vec<VNetPort>,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetGateway {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetPort {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tenant: IdName,
    /// The controller reports the VLAN as a string; "1" means untagged.
    #[serde(default)]
    pub vlan: String,
    #[serde(default)]
    pub member_state: String,
}

/// Object references the write endpoints accept by name alone.
#[derive(Serialize, Clone, Debug, Default)]
pub struct NameRef {
    pub name: String,
}

impl NameRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetAddGateway {
    pub prefix: String,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetAddPort {
    pub id: u32,
    pub name: String,
    /// VLAN as a string; "1" means untagged.
    pub vlan: String,
    pub lacp: String,
    pub state: String,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetAdd {
    pub name: String,
    pub tenant: NameRef,
    pub guest_tenants: Vec<NameRef>,
    pub state: String,
    pub sites: Vec<NameRef>,
    pub gateways: Vec<VNetAddGateway>,
    pub ports: Vec<VNetAddPort>,
    pub native_vlan: u32,
}

/// Same shape as add minus the owner, which cannot change after creation.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VNetUpdate {
    pub name: String,
    pub guest_tenants: Vec<NameRef>,
    pub state: String,
    pub sites: Vec<NameRef>,
    pub gateways: Vec<VNetAddGateway>,
    pub ports: Vec<VNetAddPort>,
    pub native_vlan: u32,
}

impl Client {
    pub async fn list_vnets(&self) -> Result<Vec<VNet>, ApiError> {
        self.list("/api/v2/vnet").await
    }

    /// Unknown IDs come back as a failed envelope, mapped to `None` here.
    pub async fn get_vnet(&self, id: u32) -> Result<Option<VNet>, ApiError> {
        match self.get(&format!("/api/v2/vnet/{id}")).await?.ok() {
            Ok(reply) => Ok(reply.decode()?),
            Err(ApiError::Api(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    pub async fn add_vnet(&self, vnet: &VNetAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/vnet", vnet).await
    }

    pub async fn update_vnet(&self, id: u32, vnet: &VNetUpdate) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/vnet/{id}"), vnet).await
    }

    pub async fn delete_vnet(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/vnet/{id}")).await
    }
}

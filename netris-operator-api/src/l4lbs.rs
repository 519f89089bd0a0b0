use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{client::Client, error::ApiError, response::ApiResponse};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "tenantID")]
    pub tenant_id: u32,
    #[serde(default, rename = "siteID")]
    pub site_id: u32,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub automatic: bool,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub health_check: HealthCheck,
    #[serde(default, rename = "backendIps", alias = "backendIPs")]
    pub backends: Vec<Backend>,
    /// UI status badge; its text doubles as the provisioning state
    #[serde(default)]
    pub label: StatusLabel,
    #[serde(default)]
    pub modified_date: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusLabel {
    #[serde(default)]
    pub text: String,
}

/// Backend as reported by the controller; the port comes back stringified.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub tcp: HealthCheckProbe,
    #[serde(default)]
    pub http: HealthCheckProbe,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckProbe {
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub request_path: String,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BackendAdd {
    pub ip: String,
    pub port: u16,
}

#[serde_as]
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BackendUpdate {
    pub ip: String,
    #[serde_as(as = "DisplayFromStr")]
    pub port: u16,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerAdd {
    pub name: String,
    pub tenant: u32,
    #[serde(rename = "siteID")]
    pub site_id: u32,
    pub automatic: bool,
    pub protocol: String,
    pub ip: String,
    pub port: u16,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub health_check: String,
    pub request_path: String,
    pub timeout: String,
    pub backend: Vec<BackendAdd>,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerUpdate {
    #[serde(rename = "tenantID")]
    pub tenant_id: u32,
    pub name: String,
    #[serde(rename = "siteID")]
    pub site_id: u32,
    pub site_name: String,
    pub automatic: bool,
    pub protocol: String,
    pub ip: String,
    pub port: u16,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub health_check: String,
    pub request_path: String,
    pub timeout: String,
    pub backend: Vec<BackendUpdate>,
}

impl Client {
    pub async fn list_l4lbs(&self) -> Result<Vec<LoadBalancer>, ApiError> {
        self.list("/api/v2/l4lb").await
    }

    pub async fn add_l4lb(&self, l4lb: &LoadBalancerAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/l4lb", l4lb).await
    }

    pub async fn update_l4lb(
        &self,
        id: u32,
        l4lb: &LoadBalancerUpdate,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/l4lb/{id}"), l4lb).await
    }

    pub async fn delete_l4lb(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/l4lb/{id}")).await
    }
}

use k8s_openapi::chrono::{DateTime, Utc};
use kube::{CustomResource, ResourceExt};
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Annotations linking a generated L4LB back to the LoadBalancer service it
/// was made from.
pub const SERVICE_NAME_ANNOTATION: &str = "servicename";
pub const SERVICE_NAMESPACE_ANNOTATION: &str = "servicenamespace";
pub const SERVICE_UID_ANNOTATION: &str = "serviceuid";
pub const SERVICE_INGRESS_IPS_ANNOTATION: &str = "serviceingressips";
/// How this L4LB relates to automatic frontend IP assignment: the `main` L4LB
/// of a service gets its IP picked by the controller, `child` L4LBs inherit
/// it, `standard` ones carry an explicit IP.
pub const IP_ROLE_ANNOTATION: &str = "iprole";

#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "L4LB",
    namespaced,
    status = "L4LBStatus",
    derive = "Default",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".spec.state"}"#,
    printcolumn = r#"{"name":"Frontend","type":"string","jsonPath":".spec.frontend.ip"}"#,
    printcolumn = r#"{"name":"Port","type":"integer","jsonPath":".spec.frontend.port"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.ownerTenant"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct L4LBSpec {
    pub state: Option<L4LBState>,
    #[serde(default)]
    pub check: L4LBCheck,
    pub owner_tenant: String,
    pub site: String,
    pub protocol: Option<L4LBProtocol>,
    pub frontend: L4LBFrontend,
    pub backend: Vec<L4LBBackend>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct L4LBStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    pub modified: Option<DateTime<Utc>>,
    /// the frontend address actually serving traffic, assigned by the
    /// controller when the frontend was left automatic
    pub ip: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum L4LBState {
    #[default]
    Active,
    Disabled,
}

impl L4LBState {
    pub fn as_str(&self) -> &'static str {
        match self {
            L4LBState::Active => "active",
            L4LBState::Disabled => "disabled",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum L4LBProtocol {
    #[default]
    Tcp,
    Udp,
}

impl L4LBProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            L4LBProtocol::Tcp => "tcp",
            L4LBProtocol::Udp => "udp",
        }
    }
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct L4LBCheck {
    #[serde(rename = "type")]
    pub type_: Option<CheckType>,
    pub timeout: Option<u32>,
    pub request_path: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Tcp,
    Http,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct L4LBFrontend {
    #[schemars(range(max = 65534))]
    pub port: u16,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub ip: Option<String>,
    #[schemars(regex(
        pattern = r"^(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(\/([0-9]|[12]\d|3[0-2]))$"
    ))]
    pub subnet: Option<String>,
}

/// A backend in `<ip>:<port>` notation.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
pub struct L4LBBackend(
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5]):([1-9]|[1-9][0-9]{1,3}|[1-5][0-9]{4}|6[0-4][0-9]{3}|65[0-4][0-9]{2}|655[0-2][0-9]|6553[0-4])$"
    ))]
    pub String,
);

impl L4LBBackend {
    /// Splits the backend into its address and port halves.
    pub fn ip_port(&self) -> Option<(&str, u16)> {
        let (ip, port) = self.0.split_once(':')?;
        Some((ip, port.parse().ok()?))
    }
}

impl From<String> for L4LBBackend {
    fn from(backend: String) -> Self {
        L4LBBackend(backend)
    }
}

impl L4LB {
    pub fn service_name(&self) -> Option<&str> {
        self.annotations()
            .get(SERVICE_NAME_ANNOTATION)
            .map(String::as_str)
    }

    pub fn service_namespace(&self) -> Option<&str> {
        self.annotations()
            .get(SERVICE_NAMESPACE_ANNOTATION)
            .map(String::as_str)
    }

    pub fn service_uid(&self) -> Option<&str> {
        self.annotations()
            .get(SERVICE_UID_ANNOTATION)
            .map(String::as_str)
    }

    pub fn service_ingress_ips(&self) -> Option<&str> {
        self.annotations()
            .get(SERVICE_INGRESS_IPS_ANNOTATION)
            .map(String::as_str)
    }

    pub fn ip_role(&self) -> Option<&str> {
        self.annotations().get(IP_ROLE_ANNOTATION).map(String::as_str)
    }

    pub fn set_service_name(&mut self, name: &str) {
        self.annotations_mut()
            .insert(SERVICE_NAME_ANNOTATION.to_owned(), name.to_owned());
    }

    pub fn set_service_namespace(&mut self, namespace: &str) {
        self.annotations_mut()
            .insert(SERVICE_NAMESPACE_ANNOTATION.to_owned(), namespace.to_owned());
    }

    pub fn set_service_uid(&mut self, uid: &str) {
        self.annotations_mut()
            .insert(SERVICE_UID_ANNOTATION.to_owned(), uid.to_owned());
    }

    pub fn set_service_ingress_ips(&mut self, ips: &str) {
        self.annotations_mut()
            .insert(SERVICE_INGRESS_IPS_ANNOTATION.to_owned(), ips.to_owned());
    }

    pub fn set_ip_role(&mut self, role: &str) {
        self.annotations_mut()
            .insert(IP_ROLE_ANNOTATION.to_owned(), role.to_owned());
    }

    /// Whether this L4LB was generated from a LoadBalancer service.
    pub fn owned_by_service(&self) -> bool {
        self.service_name().is_some()
            && self.service_namespace().is_some()
            && self.service_uid().is_some()
    }
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "L4LBMeta",
    namespaced,
    derive = "Default"
)]
pub struct L4LBMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub l4lb_generation: i64,
    pub id: u32,
    #[parent_name]
    pub l4lb_name: String,

    pub tenant_id: u32,
    pub site_id: u32,
    /// set for L4LBs whose frontend IP is picked by the controller
    pub automatic: bool,
    pub internal: u32,
    #[serde(rename = "kubenet_info")]
    pub kubenet_info: String,
    pub protocol: String,
    pub ip: String,
    pub port: u16,
    pub status: String,
    pub health_check: String,
    #[serde(rename = "timeOut")]
    pub timeout: String,
    pub request_path: String,
    #[serde(rename = "backendIps")]
    pub backend: Vec<L4LBMetaBackend>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
pub struct L4LBMetaBackend {
    pub ip: String,
    pub port: u16,
    pub maintenance: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_splits_into_ip_and_port() {
        let backend = L4LBBackend("203.0.113.7:8080".to_owned());
        assert_eq!(backend.ip_port(), Some(("203.0.113.7", 8080)));

        assert_eq!(L4LBBackend("no-port".to_owned()).ip_port(), None);
        assert_eq!(L4LBBackend("1.2.3.4:x".to_owned()).ip_port(), None);
    }
}

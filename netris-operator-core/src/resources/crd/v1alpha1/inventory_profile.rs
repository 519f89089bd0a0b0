use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::ResourceStatus;

#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "InventoryProfile",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Timezone","type":"string","jsonPath":".spec.timezone"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct InventoryProfileSpec {
    pub description: Option<String>,
    /// tz database name, e.g. `America/Los_Angeles`
    pub timezone: String,
    #[serde(default, rename = "allowSshFromIpv4")]
    pub allow_ssh_from_ipv4: Vec<String>,
    #[serde(default, rename = "allowSshFromIpv6")]
    pub allow_ssh_from_ipv6: Vec<String>,
    #[serde(default)]
    pub ntp_servers: Vec<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub custom_rules: Vec<InventoryProfileCustomRule>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProfileCustomRule {
    pub src_subnet: String,
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
    pub protocol: RuleProtocol,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    #[default]
    Any,
    Tcp,
    Udp,
}

impl RuleProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleProtocol::Any => "any",
            RuleProtocol::Tcp => "tcp",
            RuleProtocol::Udp => "udp",
        }
    }
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "InventoryProfileMeta",
    namespaced,
    derive = "Default"
)]
pub struct InventoryProfileMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub inventory_profile_generation: i64,
    pub id: u32,
    #[parent_name]
    pub inventory_profile_name: String,

    pub description: String,
    pub timezone: String,
    #[serde(rename = "allowSshFromIpv4")]
    pub allow_ssh_from_ipv4: Vec<String>,
    #[serde(rename = "allowSshFromIpv6")]
    pub allow_ssh_from_ipv6: Vec<String>,
    pub ntp_servers: Vec<String>,
    pub dns_servers: Vec<String>,
    pub custom_rules: Vec<InventoryProfileCustomRule>,
}

use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "VNet",
    namespaced,
    status = "VNetStatus",
    derive = "Default",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Gateways","type":"string","jsonPath":".spec.sites[*].gateways"}"#,
    printcolumn = r#"{"name":"Ports","type":"string","jsonPath":".spec.sites[*].switchPorts[*].name"}"#,
    printcolumn = r#"{"name":"Sites","type":"string","jsonPath":".spec.sites[*].name"}"#,
    printcolumn = r#"{"name":"Owner","type":"string","jsonPath":".spec.ownerTenant"}"#,
    printcolumn = r#"{"name":"Guest Tenants","type":"string","jsonPath":".spec.guestTenants","priority":1}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct VNetSpec {
    /// tenant owning this network
    pub owner_tenant: String,
    pub state: Option<VNetState>,
    #[serde(default)]
    pub guest_tenants: Vec<String>,
    pub sites: Vec<VNetSite>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VNetSite {
    pub name: String,
    /// gateway addresses in CIDR form
    #[serde(default)]
    pub gateways: Vec<String>,
    #[serde(default)]
    pub switch_ports: Vec<VNetSwitchPort>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VNetSwitchPort {
    /// port notation, `<port>@<switch>`
    pub name: String,
    #[schemars(range(min = 1, max = 4094))]
    pub vlan_id: Option<u16>,
    pub state: Option<VNetState>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct VNetStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    pub state: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VNetState {
    #[default]
    Active,
    Disabled,
}

impl VNetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VNetState::Active => "active",
            VNetState::Disabled => "disabled",
        }
    }
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "VNetMeta",
    namespaced,
    derive = "Default"
)]
pub struct VNetMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub vnet_generation: i64,
    pub id: u32,
    #[parent_name]
    pub vnet_name: String,

    pub owner: String,
    pub state: VNetState,
    #[serde(default)]
    pub gateways: Vec<VNetMetaGateway>,
    #[serde(default)]
    pub members: Vec<VNetMetaMember>,
    #[serde(default)]
    pub sites: Vec<VNetMetaSite>,
    /// guest tenant names; the write endpoints take them unresolved
    #[serde(default)]
    pub tenants: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VNetMetaSite {
    pub id: u32,
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VNetMetaGateway {
    pub gateway: String,
    pub gw_length: u8,
    pub version: String,
}

impl VNetMetaGateway {
    /// The `address/length` notation the controller exchanges gateways in.
    pub fn prefix(&self) -> String {
        format!("{}/{}", self.gateway, self.gw_length)
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VNetMetaMember {
    pub lacp: String,
    #[serde(rename = "member_state")]
    pub member_state: String,
    pub parent_port: u32,
    pub port_is_untagged: bool,
    #[serde(rename = "port_id")]
    pub port_id: u32,
    #[serde(rename = "port_name")]
    pub port_name: String,
    #[serde(rename = "tenant_id")]
    pub tenant_id: u32,
    #[serde(rename = "vlan_id")]
    pub vlan_id: u16,
}

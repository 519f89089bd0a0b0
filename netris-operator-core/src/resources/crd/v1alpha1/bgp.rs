use k8s_openapi::chrono::{DateTime, Utc};
use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "BGP",
    namespaced,
    status = "BGPStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Neighbor AS","type":"integer","jsonPath":".spec.neighborAs"}"#,
    printcolumn = r#"{"name":"Local Address","type":"string","jsonPath":".spec.localIP"}"#,
    printcolumn = r#"{"name":"Remote Address","type":"string","jsonPath":".spec.remoteIP"}"#,
    printcolumn = r#"{"name":"BGP State","type":"string","jsonPath":".status.bgpState","priority":1}"#,
    printcolumn = r#"{"name":"Port State","type":"string","jsonPath":".status.portState","priority":1}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct BGPSpec {
    pub site: String,
    /// softgate terminating the session unless it terminates on a switch
    #[serde(default)]
    pub softgate: String,
    pub neighbor_as: u32,
    pub transport: BgpTransport,
    #[serde(default)]
    pub terminate_on_switch: TerminateOnSwitch,
    /// local session address in CIDR form
    #[serde(rename = "localIP")]
    pub local_ip: String,
    /// neighbor address in CIDR form
    #[serde(rename = "remoteIP")]
    pub remote_ip: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: BgpState,
    #[serde(default)]
    pub default_originate: bool,
    #[serde(default)]
    pub prefix_inbound_max: u32,
    #[serde(default)]
    pub multihop: BgpMultihop,
    #[serde(default)]
    pub bgp_password: String,
    #[serde(default)]
    pub allow_as_in: u32,
    /// defaults to 100 when left zero
    #[serde(default)]
    pub local_preference: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub prepend_inbound: u32,
    #[serde(default)]
    pub prepend_outbound: u32,
    #[serde(default)]
    pub prefix_list_inbound: Vec<String>,
    #[serde(default)]
    pub prefix_list_outbound: Vec<String>,
    #[serde(default, rename = "sendBGPCommunity")]
    pub send_bgp_community: Vec<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BgpTransport {
    #[serde(default, rename = "type")]
    pub type_: TransportType,
    /// port notation (`<port>@<switch>`) or a vnet name
    pub name: String,
    #[schemars(range(min = 1, max = 4094))]
    pub vlan_id: Option<u16>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    #[default]
    Port,
    Vnet,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminateOnSwitch {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub switch_name: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BgpMultihop {
    #[serde(default)]
    pub neighbor_address: String,
    #[serde(default)]
    pub update_source: String,
    #[serde(default)]
    pub hops: u8,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BgpState {
    #[default]
    Enabled,
    Disabled,
}

impl BgpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BgpState::Enabled => "enabled",
            BgpState::Disabled => "disabled",
        }
    }
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BGPStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    /// last modification stamp reported by the controller
    pub modified: Option<DateTime<Utc>>,
    /// session summary, `bgp: <state>; prefix: <count>; time: <uptime>`
    pub bgp_state: Option<String>,
    pub bgp_status: Option<String>,
    pub bgp_prefixes: Option<u32>,
    pub port_state: Option<String>,
    pub terminate_on_switch: Option<String>,
    /// VLAN number or `untagged`
    pub vlan_id: Option<String>,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "BGPMeta",
    namespaced,
    derive = "Default"
)]
pub struct BGPMetaSpec {
    pub imported: bool,
    #[serde(rename = "reclaimPolicy")]
    pub reclaim_policy: bool,
    #[parent_generation]
    #[serde(rename = "bgpGeneration")]
    pub bgp_generation: i64,
    pub id: u32,
    #[parent_name]
    #[serde(rename = "bgpName")]
    pub bgp_name: String,
    #[serde(flatten)]
    pub session: BgpSession,
}

/// Resolved session in the controller's wire shape, which is mostly
/// snake_case with a few camelCase stragglers. Both the current kind and the
/// deprecated `EBGP` spelling carry one.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct BgpSession {
    pub site_id: u32,
    pub nfv_id: u32,
    pub nfv_port_id: u32,
    pub switch_port_id: u32,
    pub vlan: u16,
    pub rcircuit_id: u32,
    pub term_switch_id: u32,
    /// "yes" or "no"
    pub terminate_on_switch: String,
    pub neighbor_as: u32,
    pub local_ip: String,
    pub remote_ip: String,
    pub ip_version: String,
    pub prefix_length: u8,
    pub description: String,
    pub status: String,
    pub neighbor_address: Option<String>,
    pub update_source: String,
    pub multihop: u8,
    pub bgp_password: String,
    pub allowas_in: u32,
    pub originate: String,
    pub prefix_limit: u32,
    /// route-map references are not exposed on the user CR yet
    #[serde(rename = "inboundRouteMap")]
    pub inbound_route_map: u32,
    #[serde(rename = "outboundRouteMap")]
    pub outbound_route_map: u32,
    pub local_preference: u32,
    pub weight: u32,
    pub prepend_inbound: u32,
    pub prepend_outbound: u32,
    /// newline-joined prefix list rules
    pub prefix_list_inbound: String,
    pub prefix_list_outbound: String,
    /// newline-joined community list
    pub community: String,
}

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
    kind = "Nat",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".spec.state"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Action","type":"string","jsonPath":".spec.action"}"#,
    printcolumn = r#"{"name":"Protocol","type":"string","jsonPath":".spec.protocol"}"#,
    printcolumn = r#"{"name":"Source","type":"string","jsonPath":".spec.srcAddress"}"#,
    printcolumn = r#"{"name":"Destination","type":"string","jsonPath":".spec.dstAddress"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct NatSpec {
    pub comment: Option<String>,
    pub state: Option<NatState>,
    pub site: String,
    pub action: NatAction,
    pub protocol: NatProtocol,
    pub src_address: String,
    /// port or port range, e.g. `1-65535`
    pub src_port: Option<String>,
    pub dst_address: String,
    pub dst_port: Option<String>,
    #[serde(rename = "snatToIP")]
    pub snat_to_ip: Option<String>,
    pub snat_to_pool: Option<String>,
    #[serde(rename = "dnatToIP")]
    pub dnat_to_ip: Option<String>,
    pub dnat_to_port: Option<u16>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NatState {
    #[default]
    Enabled,
    Disabled,
}

impl NatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NatState::Enabled => "enabled",
            NatState::Disabled => "disabled",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NatAction {
    #[default]
    AcceptSnat,
    Snat,
    Dnat,
    Masquerade,
}

impl NatAction {
    /// The controller keeps NAT actions upper-cased.
    pub fn as_upper(&self) -> &'static str {
        match self {
            NatAction::AcceptSnat => "ACCEPT_SNAT",
            NatAction::Snat => "SNAT",
            NatAction::Dnat => "DNAT",
            NatAction::Masquerade => "MASQUERADE",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NatProtocol {
    #[default]
    All,
    Tcp,
    Udp,
    Icmp,
}

impl NatProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            NatProtocol::All => "all",
            NatProtocol::Tcp => "tcp",
            NatProtocol::Udp => "udp",
            NatProtocol::Icmp => "icmp",
        }
    }

    /// Ports only make sense for the port-aware protocols.
    pub fn carries_ports(&self) -> bool {
        matches!(self, NatProtocol::Tcp | NatProtocol::Udp)
    }
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "NatMeta",
    namespaced,
    derive = "Default"
)]
pub struct NatMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub nat_generation: i64,
    pub id: u32,
    #[parent_name]
    pub nat_name: String,

    pub comment: String,
    pub state: String,
    pub site_id: u32,
    pub action: String,
    pub protocol: String,
    pub src_address: String,
    pub src_port: String,
    pub dst_address: String,
    pub dst_port: String,
    #[serde(rename = "snatToIP")]
    pub snat_to_ip: String,
    pub snat_to_pool: String,
    #[serde(rename = "dnatToIP")]
    pub dnat_to_ip: String,
    pub dnat_to_port: u16,
}

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
    kind = "Switch",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.tenant"}"#,
    printcolumn = r#"{"name":"NOS","type":"string","jsonPath":".spec.nos"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"ASN","type":"string","jsonPath":".spec.asn"}"#,
    printcolumn = r#"{"name":"Profile","type":"string","jsonPath":".spec.profile"}"#,
    printcolumn = r#"{"name":"Main IP","type":"string","jsonPath":".spec.mainIp"}"#,
    printcolumn = r#"{"name":"Management IP","type":"string","jsonPath":".spec.mgmtIp"}"#,
    printcolumn = r#"{"name":"Ports Count","type":"string","jsonPath":".spec.portsCount"}"#,
    printcolumn = r#"{"name":"MAC","type":"string","jsonPath":".spec.macAddress"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct SwitchSpec {
    pub tenant: String,
    pub description: Option<String>,
    /// tag of the network operating system to install
    pub nos: SwitchNosTag,
    pub site: String,
    /// zero lets the controller pick one
    pub asn: Option<u32>,
    pub profile: Option<String>,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub main_ip: Option<String>,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub mgmt_ip: Option<String>,
    pub ports_count: PortsCount,
    #[schemars(regex(pattern = r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$"))]
    pub mac_address: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SwitchNosTag {
    #[default]
    CumulusLinux,
    UbuntuSwitchDev,
    Sonic,
}

impl SwitchNosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchNosTag::CumulusLinux => "cumulus_linux",
            SwitchNosTag::UbuntuSwitchDev => "ubuntu_switch_dev",
            SwitchNosTag::Sonic => "sonic",
        }
    }
}

/// Front-panel port counts the hardware profiles know about.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
pub enum PortsCount {
    #[serde(rename = "16")]
    Sixteen,
    #[serde(rename = "32")]
    #[default]
    ThirtyTwo,
    #[serde(rename = "48")]
    FortyEight,
    #[serde(rename = "54")]
    FiftyFour,
    #[serde(rename = "56")]
    FiftySix,
    #[serde(rename = "64")]
    SixtyFour,
}

impl PortsCount {
    pub fn as_u32(&self) -> u32 {
        match self {
            PortsCount::Sixteen => 16,
            PortsCount::ThirtyTwo => 32,
            PortsCount::FortyEight => 48,
            PortsCount::FiftyFour => 54,
            PortsCount::FiftySix => 56,
            PortsCount::SixtyFour => 64,
        }
    }
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "SwitchMeta",
    namespaced,
    derive = "Default"
)]
pub struct SwitchMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub switch_generation: i64,
    pub id: u32,
    #[parent_name]
    pub switch_name: String,

    #[serde(rename = "tenant")]
    pub tenant_id: u32,
    pub description: String,
    /// full NOS record looked up from the tag
    pub nos: SwitchNos,
    #[serde(rename = "site")]
    pub site_id: u32,
    pub asn: u32,
    #[serde(rename = "profile")]
    pub profile_id: u32,
    pub main_ip: String,
    pub mgmt_ip: String,
    pub ports_count: u32,
    pub mac_address: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, JsonSchema)]
pub struct SwitchNos {
    pub id: u32,
    pub name: String,
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_count_keeps_the_numeric_wire_form() {
        let json = serde_json::to_string(&PortsCount::FortyEight).unwrap();
        assert_eq!(json, "\"48\"");
        assert_eq!(PortsCount::FortyEight.as_u32(), 48);
    }
}

use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ResourceStatus;

#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "Site",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Public ASN","type":"integer","jsonPath":".spec.publicAsn"}"#,
    printcolumn = r#"{"name":"ROH ASN","type":"integer","jsonPath":".spec.rohAsn"}"#,
    printcolumn = r#"{"name":"VM ASN","type":"integer","jsonPath":".spec.vmAsn"}"#,
    printcolumn = r#"{"name":"ROH Routing Profile","type":"string","jsonPath":".spec.rohRoutingProfile"}"#,
    printcolumn = r#"{"name":"Site Mesh","type":"string","jsonPath":".spec.siteMesh"}"#,
    printcolumn = r#"{"name":"ACL Default Policy","type":"string","jsonPath":".spec.aclDefaultPolicy"}"#
)]
pub struct SiteSpec {
    /// ASN announced to the outside world
    #[schemars(range(max = 65534))]
    pub public_asn: u32,
    /// ASN used for routing-on-the-host instances
    #[schemars(range(max = 65534))]
    pub roh_asn: u32,
    /// ASN used for virtual machine instances
    #[schemars(range(max = 65534))]
    pub vm_asn: u32,
    pub roh_routing_profile: RoutingProfile,
    pub site_mesh: SiteMesh,
    pub acl_default_policy: AclPolicy,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "SiteMeta",
    namespaced,
    derive = "Default"
)]
pub struct SiteMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub site_generation: i64,
    pub id: u32,
    #[parent_name]
    pub site_name: String,

    pub public_asn: u32,
    pub roh_asn: u32,
    pub vm_asn: u32,
    /// routing profile resolved to its fixed controller-side ID
    pub roh_routing_profile: u32,
    pub site_mesh: SiteMesh,
    pub acl_default_policy: AclPolicy,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProfile {
    #[default]
    Default,
    DefaultAgg,
    Full,
}

impl RoutingProfile {
    /// Controller-side IDs of the built-in routing profiles.
    pub fn remote_id(&self) -> u32 {
        match self {
            RoutingProfile::Default => 1,
            RoutingProfile::DefaultAgg => 2,
            RoutingProfile::Full => 3,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SiteMesh {
    #[default]
    Disabled,
    Hub,
    Spoke,
    Dspoke,
}

impl SiteMesh {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteMesh::Disabled => "disabled",
            SiteMesh::Hub => "hub",
            SiteMesh::Spoke => "spoke",
            SiteMesh::Dspoke => "dspoke",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AclPolicy {
    #[default]
    Permit,
    Deny,
}

impl AclPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclPolicy::Permit => "permit",
            AclPolicy::Deny => "deny",
        }
    }
}

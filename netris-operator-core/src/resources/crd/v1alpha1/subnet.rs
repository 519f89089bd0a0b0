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
    kind = "Subnet",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Prefix","type":"string","jsonPath":".spec.prefix"}"#,
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.tenant"}"#,
    printcolumn = r#"{"name":"Purpose","type":"string","jsonPath":".spec.purpose"}"#,
    printcolumn = r#"{"name":"Sites","type":"string","jsonPath":".spec.sites"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct SubnetSpec {
    /// CIDR range of the subnet
    pub prefix: String,
    pub tenant: String,
    /// what the subnet is used for, e.g. common, load-balancer, management
    pub purpose: String,
    pub default_gateway: Option<String>,
    /// sites this subnet is stretched over
    #[serde(default)]
    pub sites: Vec<String>,
}

#[skip_serializing_none]
#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "SubnetMeta",
    namespaced,
    derive = "Default"
)]
pub struct SubnetMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub subnet_generation: i64,
    pub id: u32,
    #[parent_name]
    pub subnet_name: String,

    pub prefix: String,
    #[serde(rename = "tenantid")]
    pub tenant_id: u32,
    pub purpose: String,
    pub default_gateway: Option<String>,
    #[serde(default)]
    pub sites: Vec<u32>,
}

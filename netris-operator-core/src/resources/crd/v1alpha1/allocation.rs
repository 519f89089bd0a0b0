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
    kind = "Allocation",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Prefix","type":"string","jsonPath":".spec.prefix"}"#,
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.tenant"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct AllocationSpec {
    /// CIDR range reserved by this allocation
    pub prefix: String,
    pub tenant: String,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "AllocationMeta",
    namespaced,
    derive = "Default"
)]
pub struct AllocationMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub allocation_generation: i64,
    pub id: u32,
    #[parent_name]
    pub allocation_name: String,

    pub prefix: String,
    /// tenant stays a name here; the remote side resolves it on its own
    pub tenant: String,
}

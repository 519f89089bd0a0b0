use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::bgp::{BGPSpec, BGPStatus, BgpSession};

/// Deprecated spelling of the BGP kind, kept so manifests written against
/// the old name keep applying. Carries the successor's spec and drives the
/// same remote collection.
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "EBGP",
    namespaced,
    status = "BGPStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Neighbor AS","type":"integer","jsonPath":".spec.neighborAs"}"#,
    printcolumn = r#"{"name":"Local Address","type":"string","jsonPath":".spec.localIP"}"#,
    printcolumn = r#"{"name":"Remote Address","type":"string","jsonPath":".spec.remoteIP"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct EBGPSpec {
    #[serde(flatten)]
    pub bgp: BGPSpec,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "EBGPMeta",
    namespaced,
    derive = "Default"
)]
pub struct EBGPMetaSpec {
    pub imported: bool,
    #[serde(rename = "reclaimPolicy")]
    pub reclaim_policy: bool,
    #[parent_generation]
    #[serde(rename = "ebgpGeneration")]
    pub ebgp_generation: i64,
    pub id: u32,
    #[parent_name]
    #[serde(rename = "ebgpName")]
    pub ebgp_name: String,
    #[serde(flatten)]
    pub session: BgpSession,
}

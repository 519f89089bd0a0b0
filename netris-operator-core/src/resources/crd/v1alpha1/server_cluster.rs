use k8s_openapi::chrono::{DateTime, Utc};
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
    kind = "ServerCluster",
    namespaced,
    status = "ServerClusterStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Admin","type":"string","jsonPath":".spec.admin"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"VPC","type":"string","jsonPath":".spec.vpc"}"#,
    printcolumn = r#"{"name":"Template","type":"string","jsonPath":".spec.template"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Modified","type":"date","jsonPath":".status.modified","priority":1}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ServerClusterSpec {
    /// admin tenant owning the cluster
    pub admin: String,
    pub site: String,
    pub vpc: String,
    pub template: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct ServerClusterStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    pub modified: Option<DateTime<Utc>>,
}

/// Keeps both the names users wrote and the IDs they resolved to, so drift in
/// either is visible.
#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "ServerClusterMeta",
    namespaced,
    derive = "Default"
)]
pub struct ServerClusterMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub server_cluster_generation: i64,
    pub id: u32,
    /// the parent resource's UID, mirrors this meta object's own name
    pub name: String,
    #[parent_name]
    pub server_cluster_name: String,

    pub admin_id: u32,
    pub admin: String,
    pub site_id: u32,
    pub site: String,
    pub vpc_id: u32,
    pub vpc: String,
    pub template_id: u32,
    pub template: String,
    pub tags: Vec<String>,
}

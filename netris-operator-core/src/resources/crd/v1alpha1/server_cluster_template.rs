use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::gen::SchemaGenerator;
use schemars::schema::{Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ResourceStatus;

/// Templates hold whatever vnet layout the controller understands, so the
/// schema keeps the array elements open instead of typing them.
fn preserve_arbitrary(_gen: &mut SchemaGenerator) -> Schema {
    let mut obj = SchemaObject::default();
    obj.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_owned(),
        serde_json::json!(true),
    );
    Schema::Object(obj)
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "ServerClusterTemplate",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ServerClusterTemplateSpec {
    #[serde(default)]
    #[schemars(schema_with = "preserve_arbitrary")]
    pub vnets: Vec<Value>,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "ServerClusterTemplateMeta",
    namespaced,
    derive = "Default"
)]
pub struct ServerClusterTemplateMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub server_cluster_template_generation: i64,
    pub id: u32,
    /// name carried by the remote object, mirrors the parent's
    pub name: String,
    #[parent_name]
    pub server_cluster_template_name: String,

    #[serde(default)]
    #[schemars(schema_with = "preserve_arbitrary")]
    pub vnets: Vec<Value>,
}

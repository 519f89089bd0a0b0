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
    kind = "Controller",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.tenant"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Main IP","type":"string","jsonPath":".spec.mainIp"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ControllerSpec {
    pub tenant: String,
    pub description: Option<String>,
    pub site: String,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub main_ip: Option<String>,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "ControllerMeta",
    namespaced,
    derive = "Default"
)]
pub struct ControllerMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub controller_generation: i64,
    pub id: u32,
    #[parent_name]
    pub controller_name: String,

    #[serde(rename = "tenant")]
    pub tenant_id: u32,
    pub description: String,
    #[serde(rename = "site")]
    pub site_id: u32,
    pub main_ip: String,
}

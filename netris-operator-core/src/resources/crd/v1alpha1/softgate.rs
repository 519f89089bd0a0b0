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
    kind = "Softgate",
    namespaced,
    status = "ResourceStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Tenant","type":"string","jsonPath":".spec.tenant"}"#,
    printcolumn = r#"{"name":"Site","type":"string","jsonPath":".spec.site"}"#,
    printcolumn = r#"{"name":"Routing Profile","type":"string","jsonPath":".spec.profile"}"#,
    printcolumn = r#"{"name":"Main IP","type":"string","jsonPath":".spec.mainIp"}"#,
    printcolumn = r#"{"name":"Management IP","type":"string","jsonPath":".spec.mgmtIp"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct SoftgateSpec {
    pub tenant: String,
    pub description: Option<String>,
    pub site: String,
    pub profile: Option<String>,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub main_ip: Option<String>,
    #[schemars(regex(
        pattern = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])$"
    ))]
    pub mgmt_ip: Option<String>,
}

/// Wire names for the resolved IDs are all-lowercase here, unlike the other
/// meta kinds.
#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "SoftgateMeta",
    namespaced,
    derive = "Default"
)]
pub struct SoftgateMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub softgate_generation: i64,
    pub id: u32,
    #[parent_name]
    pub softgate_name: String,

    #[serde(rename = "tenantid")]
    pub tenant_id: u32,
    pub description: String,
    #[serde(rename = "siteid")]
    pub site_id: u32,
    #[serde(rename = "profileid")]
    pub profile_id: u32,
    pub main_ip: String,
    pub mgmt_ip: String,
}

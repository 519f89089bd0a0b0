use k8s_openapi::chrono::{DateTime, Utc};
use kube::CustomResource;
use netris_operator_macros::ResolvedSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "VPC",
    namespaced,
    status = "VPCStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Admin Tenant","type":"string","jsonPath":".spec.adminTenant"}"#,
    printcolumn = r#"{"name":"Guest Tenants","type":"string","jsonPath":".spec.guestTenants","priority":1}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Modified","type":"date","jsonPath":".status.modified","priority":1}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct VPCSpec {
    /// tenant owning this VPC
    pub admin_tenant: String,
    /// tenants allowed to use, but not manage, the VPC
    #[serde(default)]
    pub guest_tenants: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct VPCStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    /// last modification stamp reported by the controller
    pub modified: Option<DateTime<Utc>>,
}

#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "VPCMeta",
    namespaced,
    derive = "Default"
)]
pub struct VPCMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub vpc_generation: i64,
    pub id: u32,
    /// name carried by the remote object, mirrors the parent's
    pub name: String,
    #[parent_name]
    pub vpc_name: String,

    pub admin_tenant: String,
    pub admin_tenant_id: u32,
    #[serde(default)]
    pub guest_tenants: Vec<String>,
    #[serde(default)]
    pub guest_tenant_ids: Vec<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

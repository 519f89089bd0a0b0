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
    kind = "Link",
    namespaced,
    status = "LinkStatus",
    derive = "Default",
    printcolumn = r#"{"name":"Ports","type":"string","jsonPath":".status.ports"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct LinkSpec {
    /// both ends of the link, in `<port>@<switch>` notation
    #[schemars(length(min = 2, max = 2))]
    pub ports: Vec<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct LinkStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    pub ports: Option<String>,
}

/// Links have no controller-assigned ID, so the two resolved port IDs joined
/// with a dash stand in for one.
#[derive(CustomResource, ResolvedSpec, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "k8s.netris.ai",
    version = "v1alpha1",
    kind = "LinkMeta",
    namespaced,
    derive = "Default"
)]
pub struct LinkMetaSpec {
    pub imported: bool,
    pub reclaim_policy: bool,
    #[parent_generation]
    pub link_generation: i64,
    pub id: String,
    #[parent_name]
    pub link_name: String,

    pub local: u32,
    pub remote: u32,
}

impl LinkMetaSpec {
    pub fn composite_id(local: u32, remote: u32) -> String {
        format!("{local}-{remote}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_joins_port_ids() {
        assert_eq!(LinkMetaSpec::composite_id(61, 64), "61-64");
    }
}

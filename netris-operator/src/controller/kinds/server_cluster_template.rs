use async_trait::async_trait;
use netris_operator_api::templates;
use netris_operator_core::resources::crd::v1alpha1::{
    server_cluster_template::{
        ServerClusterTemplate, ServerClusterTemplateMeta, ServerClusterTemplateMetaSpec,
    },
    ResourceStatus,
};
use serde_json::Value;

use crate::controller::{
    context::ReconcilerContext,
    error::ReconcilerError,
    sync::{ProvisionState, SyncKind, SyncOutcome},
    RequireMetadata,
};

use super::{added_id, ensure_ok};

pub struct ServerClusterTemplateSync;

#[async_trait]
impl SyncKind for ServerClusterTemplateSync {
    type Resource = ServerClusterTemplate;
    type Meta = ServerClusterTemplateMeta;
    type MetaSpec = ServerClusterTemplateMetaSpec;
    type Id = u32;
    type Remote = templates::ClusterTemplate;
    type Status = ResourceStatus;

    const KIND: &'static str = "ServerClusterTemplate";

    async fn translate(
        _context: &ReconcilerContext,
        resource: &ServerClusterTemplate,
    ) -> Result<ServerClusterTemplateMetaSpec, ReconcilerError> {
        let name = resource.require_name()?.to_owned();

        Ok(ServerClusterTemplateMetaSpec {
            name: name.clone(),
            server_cluster_template_name: name,
            vnets: resource.spec.vnets.clone(),
            ..Default::default()
        })
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &ServerClusterTemplateMeta,
    ) -> Result<Option<templates::ClusterTemplate>, ReconcilerError> {
        Ok(context
            .storage
            .cluster_templates
            .find(|template| template.name == meta.spec.server_cluster_template_name)
            .await)
    }

    fn remote_id(remote: &templates::ClusterTemplate) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &ServerClusterTemplateMeta,
    ) -> Result<Option<templates::ClusterTemplate>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .cluster_templates
            .find_refreshed(
                |template| template.id == id,
                || context.netris.list_cluster_templates(),
            )
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &ServerClusterTemplateMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_cluster_template(&template_add(&meta.spec))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &ServerClusterTemplateMeta,
        _current: &templates::ClusterTemplate,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_cluster_template(meta.spec.id, &template_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &ServerClusterTemplateMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_cluster_template(meta.spec.id).await?)
    }

    fn differs(spec: &ServerClusterTemplateMetaSpec, remote: &templates::ClusterTemplate) -> bool {
        // the vnet layout is free-form, so drift is structural JSON inequality
        remote.name != spec.server_cluster_template_name
            || remote.vnets.as_array() != Some(&spec.vnets)
    }

    fn provision_state(_remote: &templates::ClusterTemplate) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, templates::ClusterTemplate>) -> ResourceStatus {
        outcome.resource_status()
    }
}

fn template_add(spec: &ServerClusterTemplateMetaSpec) -> templates::ClusterTemplateAdd {
    templates::ClusterTemplateAdd {
        name: spec.server_cluster_template_name.clone(),
        vnets: Value::Array(spec.vnets.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn translated() -> ServerClusterTemplateMetaSpec {
        ServerClusterTemplateMetaSpec {
            server_cluster_template_name: "dgx-pod".to_owned(),
            vnets: vec![json!({"postfix": "east", "serversPerSwitch": 8, "vlanID": "untagged"})],
            ..Default::default()
        }
    }

    #[test]
    fn key_order_is_not_drift() {
        let remote = templates::ClusterTemplate {
            id: 4,
            name: "dgx-pod".to_owned(),
            vnets: json!([{"vlanID": "untagged", "postfix": "east", "serversPerSwitch": 8}]),
        };

        assert!(!ServerClusterTemplateSync::differs(&translated(), &remote));
    }

    #[test]
    fn layout_changes_are_drift() {
        let remote = templates::ClusterTemplate {
            id: 4,
            name: "dgx-pod".to_owned(),
            vnets: json!([{"postfix": "east", "serversPerSwitch": 4, "vlanID": "untagged"}]),
        };

        assert!(ServerClusterTemplateSync::differs(&translated(), &remote));
    }

    #[test]
    fn payload_wraps_the_layout_in_an_array() {
        let payload = template_add(&translated());

        assert_eq!(payload.name, "dgx-pod");
        assert!(payload.vnets.is_array());
    }
}

use async_trait::async_trait;
use itertools::Itertools;
use kube::ResourceExt;
use netris_operator_api::{server_clusters, IdName};
use netris_operator_core::resources::crd::v1alpha1::server_cluster::{
    ServerCluster, ServerClusterMeta, ServerClusterMetaSpec, ServerClusterStatus,
};

use crate::{
    controller::{
        context::ReconcilerContext,
        error::ReconcilerError,
        sync::{ProvisionState, SyncKind, SyncOutcome},
        RequireMetadata,
    },
    storage::Storage,
};

use super::{added_id, ensure_ok, modified_timestamp};

pub struct ServerClusterSync;

#[async_trait]
impl SyncKind for ServerClusterSync {
    type Resource = ServerCluster;
    type Meta = ServerClusterMeta;
    type MetaSpec = ServerClusterMetaSpec;
    type Id = u32;
    type Remote = server_clusters::ServerCluster;
    type Status = ServerClusterStatus;

    const KIND: &'static str = "ServerCluster";

    async fn translate(
        context: &ReconcilerContext,
        resource: &ServerCluster,
    ) -> Result<ServerClusterMetaSpec, ReconcilerError> {
        translate_cluster(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &ServerClusterMeta,
    ) -> Result<Option<server_clusters::ServerCluster>, ReconcilerError> {
        Ok(context
            .storage
            .server_clusters
            .find(|cluster| cluster.name == meta.spec.server_cluster_name)
            .await)
    }

    fn remote_id(remote: &server_clusters::ServerCluster) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &ServerClusterMeta,
    ) -> Result<Option<server_clusters::ServerCluster>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .server_clusters
            .find_refreshed(
                |cluster| cluster.id == id,
                || context.netris.list_server_clusters(),
            )
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &ServerClusterMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_server_cluster(&cluster_add(&meta.spec))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &ServerClusterMeta,
        _current: &server_clusters::ServerCluster,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_server_cluster(meta.spec.id, &cluster_update(&meta.spec))
                .await?,
        )
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &ServerClusterMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_server_cluster(meta.spec.id).await?)
    }

    /// Placement is fixed at creation, so only what the update call can
    /// change counts as drift.
    fn differs(spec: &ServerClusterMetaSpec, remote: &server_clusters::ServerCluster) -> bool {
        remote.name != spec.server_cluster_name
            || !spec.tags.iter().sorted().eq(remote.tags.iter().sorted())
    }

    fn provision_state(_remote: &server_clusters::ServerCluster) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, server_clusters::ServerCluster>) -> ServerClusterStatus {
        let modified = match &outcome {
            SyncOutcome::Synced { remote, .. } => modified_timestamp(remote.modified_date),
            _ => None,
        };
        let base = outcome.resource_status();

        ServerClusterStatus {
            status: base.status,
            message: base.message,
            modified,
        }
    }
}

async fn translate_cluster(
    storage: &Storage,
    resource: &ServerCluster,
) -> Result<ServerClusterMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let admin = storage
        .tenants
        .find(|tenant| tenant.name == spec.admin)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(
                format!("'{}' admin tenant not found", spec.admin).into(),
            )
        })?;

    let site = storage
        .sites
        .find(|site| site.name == spec.site)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("'{}' site not found", spec.site).into())
        })?;

    let vpc = storage
        .vpcs
        .find(|vpc| vpc.name == spec.vpc)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("'{}' vpc not found", spec.vpc).into())
        })?;

    // a cluster may run templateless; only a named template has to resolve
    let template_id = if spec.template.is_empty() {
        0
    } else {
        storage
            .cluster_templates
            .find(|template| template.name == spec.template)
            .await
            .map(|template| template.id)
            .ok_or_else(|| {
                ReconcilerError::TranslateError(
                    format!("'{}' template not found", spec.template).into(),
                )
            })?
    };

    Ok(ServerClusterMetaSpec {
        name: resource.uid().ok_or(ReconcilerError::MissingObjectMetadata)?,
        server_cluster_name: resource.require_name()?.to_owned(),
        admin_id: admin.id,
        admin: spec.admin.clone(),
        site_id: site.id,
        site: spec.site.clone(),
        vpc_id: vpc.id,
        vpc: spec.vpc.clone(),
        template_id,
        template: spec.template.clone(),
        tags: spec.tags.clone(),
        ..Default::default()
    })
}

fn cluster_add(spec: &ServerClusterMetaSpec) -> server_clusters::ServerClusterAdd {
    server_clusters::ServerClusterAdd {
        name: spec.server_cluster_name.clone(),
        admin: IdName::named(spec.admin_id, &spec.admin),
        site: IdName::named(spec.site_id, &spec.site),
        vpc: IdName::named(spec.vpc_id, &spec.vpc),
        template: IdName::named(spec.template_id, &spec.template),
        tags: spec.tags.clone(),
    }
}

fn cluster_update(spec: &ServerClusterMetaSpec) -> server_clusters::ServerClusterUpdate {
    server_clusters::ServerClusterUpdate {
        name: spec.server_cluster_name.clone(),
        tags: spec.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{sites::Site, templates::ClusterTemplate, tenants::Tenant, vpcs::Vpc};
    use netris_operator_core::resources::crd::v1alpha1::server_cluster::ServerClusterSpec;

    use super::*;

    async fn seeded_storage() -> Storage {
        let storage = Storage::new();
        storage
            .tenants
            .replace(vec![Tenant {
                id: 2,
                name: "Admin".to_owned(),
            }])
            .await;
        storage
            .sites
            .replace(vec![Site {
                id: 3,
                name: "yerevan".to_owned(),
                ..Default::default()
            }])
            .await;
        storage
            .vpcs
            .replace(vec![Vpc {
                id: 9,
                name: "green".to_owned(),
                ..Default::default()
            }])
            .await;
        storage
            .cluster_templates
            .replace(vec![ClusterTemplate {
                id: 4,
                name: "dgx-pod".to_owned(),
                ..Default::default()
            }])
            .await;

        storage
    }

    fn cluster(template: &str) -> ServerCluster {
        let mut cluster = ServerCluster::new(
            "training-1",
            ServerClusterSpec {
                admin: "Admin".to_owned(),
                site: "yerevan".to_owned(),
                vpc: "green".to_owned(),
                template: template.to_owned(),
                tags: vec!["gpu".to_owned()],
            },
        );
        cluster.metadata.uid = Some("8a6b".to_owned());

        cluster
    }

    #[tokio::test]
    async fn translation_resolves_every_placement_name() {
        let storage = seeded_storage().await;

        let spec = translate_cluster(&storage, &cluster("dgx-pod"))
            .await
            .unwrap();
        assert_eq!(spec.name, "8a6b");
        assert_eq!(spec.server_cluster_name, "training-1");
        assert_eq!(spec.admin_id, 2);
        assert_eq!(spec.site_id, 3);
        assert_eq!(spec.vpc_id, 9);
        assert_eq!(spec.template_id, 4);

        let error = translate_cluster(&storage, &cluster("hgx-pod"))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "'hgx-pod' template not found");
    }

    #[tokio::test]
    async fn templateless_clusters_translate() {
        let storage = seeded_storage().await;

        let spec = translate_cluster(&storage, &cluster("")).await.unwrap();
        assert_eq!(spec.template_id, 0);
    }

    #[test]
    fn placement_is_not_compared_for_drift() {
        let spec = ServerClusterMetaSpec {
            server_cluster_name: "training-1".to_owned(),
            site_id: 3,
            tags: vec!["gpu".to_owned(), "prod".to_owned()],
            ..Default::default()
        };
        let remote = server_clusters::ServerCluster {
            id: 11,
            name: "training-1".to_owned(),
            site: IdName::named(5, "paris"),
            tags: vec!["prod".to_owned(), "gpu".to_owned()],
            ..Default::default()
        };

        assert!(!ServerClusterSync::differs(&spec, &remote));

        let mut retagged = remote;
        retagged.tags = vec!["gpu".to_owned()];
        assert!(ServerClusterSync::differs(&spec, &retagged));
    }
}

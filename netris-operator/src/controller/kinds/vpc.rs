use async_trait::async_trait;
use itertools::Itertools;
use netris_operator_api::{vpcs, IdName};
use netris_operator_core::resources::crd::v1alpha1::vpc::{VPCMeta, VPCMetaSpec, VPCStatus, VPC};

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

pub struct VPCSync;

#[async_trait]
impl SyncKind for VPCSync {
    type Resource = VPC;
    type Meta = VPCMeta;
    type MetaSpec = VPCMetaSpec;
    type Id = u32;
    type Remote = vpcs::Vpc;
    type Status = VPCStatus;

    const KIND: &'static str = "VPC";

    async fn translate(
        context: &ReconcilerContext,
        resource: &VPC,
    ) -> Result<VPCMetaSpec, ReconcilerError> {
        translate_vpc(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &VPCMeta,
    ) -> Result<Option<vpcs::Vpc>, ReconcilerError> {
        Ok(context
            .storage
            .vpcs
            .find(|vpc| vpc.name == meta.spec.vpc_name)
            .await)
    }

    fn remote_id(remote: &vpcs::Vpc) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &VPCMeta,
    ) -> Result<Option<vpcs::Vpc>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .vpcs
            .find_refreshed(|vpc| vpc.id == id, || context.netris.list_vpcs())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &VPCMeta) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_vpc(&vpc_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &VPCMeta,
        _current: &vpcs::Vpc,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_vpc(meta.spec.id, &vpc_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &VPCMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_vpc(meta.spec.id).await?)
    }

    fn differs(spec: &VPCMetaSpec, remote: &vpcs::Vpc) -> bool {
        let guests_differ = !spec
            .guest_tenant_ids
            .iter()
            .copied()
            .sorted()
            .eq(remote.guest_tenants.iter().map(|tenant| tenant.id).sorted());
        let tags_differ = !spec
            .tags
            .iter()
            .sorted()
            .eq(remote.tags.iter().sorted());

        remote.name != spec.vpc_name
            || remote.admin_tenant.id != spec.admin_tenant_id
            || guests_differ
            || tags_differ
    }

    fn provision_state(_remote: &vpcs::Vpc) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, vpcs::Vpc>) -> VPCStatus {
        let base = outcome.resource_status();
        let modified = match &outcome {
            SyncOutcome::Synced { remote, .. } => modified_timestamp(remote.modified_date),
            _ => None,
        };

        VPCStatus {
            status: base.status,
            message: base.message,
            modified,
        }
    }
}

async fn translate_vpc(storage: &Storage, resource: &VPC) -> Result<VPCMetaSpec, ReconcilerError> {
    let spec = &resource.spec;
    let name = resource.require_name()?.to_owned();

    let admin = storage
        .tenants
        .find(|tenant| tenant.name == spec.admin_tenant)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(
                format!("'{}' admin tenant not found", spec.admin_tenant).into(),
            )
        })?;

    let mut guest_tenants = Vec::with_capacity(spec.guest_tenants.len());
    let mut guest_tenant_ids = Vec::with_capacity(spec.guest_tenants.len());
    for tenant_name in &spec.guest_tenants {
        let tenant = storage
            .tenants
            .find(|tenant| &tenant.name == tenant_name)
            .await
            .ok_or_else(|| {
                ReconcilerError::TranslateError(
                    format!("'{tenant_name}' guest tenant not found").into(),
                )
            })?;
        guest_tenants.push(tenant.name);
        guest_tenant_ids.push(tenant.id);
    }

    Ok(VPCMetaSpec {
        name: name.clone(),
        vpc_name: name,
        admin_tenant: spec.admin_tenant.clone(),
        admin_tenant_id: admin.id,
        guest_tenants,
        guest_tenant_ids,
        tags: spec.tags.clone(),
        ..Default::default()
    })
}

fn vpc_add(spec: &VPCMetaSpec) -> vpcs::VpcAdd {
    let guest_tenants = spec
        .guest_tenant_ids
        .iter()
        .zip(&spec.guest_tenants)
        .map(|(id, name)| IdName::named(*id, name))
        .collect();

    vpcs::VpcAdd {
        name: spec.vpc_name.clone(),
        admin_tenant: IdName::named(spec.admin_tenant_id, &spec.admin_tenant),
        guest_tenants,
        tags: spec.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use netris_operator_api::tenants::Tenant;
    use netris_operator_core::resources::crd::v1alpha1::vpc::VPCSpec;

    use super::*;

    async fn seeded_storage() -> Storage {
        let storage = Storage::new();
        storage
            .tenants
            .replace(vec![
                Tenant {
                    id: 1,
                    name: "Admin".to_owned(),
                },
                Tenant {
                    id: 4,
                    name: "Dev".to_owned(),
                },
            ])
            .await;

        storage
    }

    #[tokio::test]
    async fn translation_resolves_admin_and_guests() {
        let storage = seeded_storage().await;
        let vpc = VPC::new(
            "blue",
            VPCSpec {
                admin_tenant: "Admin".to_owned(),
                guest_tenants: vec!["Dev".to_owned()],
                tags: vec!["prod".to_owned()],
            },
        );

        let spec = translate_vpc(&storage, &vpc).await.unwrap();

        assert_eq!(spec.admin_tenant_id, 1);
        assert_eq!(spec.guest_tenant_ids, vec![4]);
        assert_eq!(spec.vpc_name, "blue");
    }

    #[tokio::test]
    async fn missing_tenants_fail_with_their_role() {
        let storage = seeded_storage().await;
        let vpc = VPC::new(
            "blue",
            VPCSpec {
                admin_tenant: "Ops".to_owned(),
                ..Default::default()
            },
        );

        let error = translate_vpc(&storage, &vpc).await.unwrap_err();
        assert_eq!(error.to_string(), "'Ops' admin tenant not found");
    }

    #[test]
    fn guest_and_tag_sets_compare_unordered() {
        let spec = VPCMetaSpec {
            vpc_name: "blue".to_owned(),
            admin_tenant_id: 1,
            guest_tenant_ids: vec![4, 9],
            tags: vec!["b".to_owned(), "a".to_owned()],
            ..Default::default()
        };

        let remote = vpcs::Vpc {
            id: 2,
            name: "blue".to_owned(),
            admin_tenant: IdName::named(1, "Admin"),
            guest_tenants: vec![IdName::id(9), IdName::id(4)],
            tags: vec!["a".to_owned(), "b".to_owned()],
            ..Default::default()
        };

        assert!(!VPCSync::differs(&spec, &remote));

        let mut retagged = remote;
        retagged.tags.push("c".to_owned());
        assert!(VPCSync::differs(&spec, &retagged));
    }
}

use async_trait::async_trait;
use netris_operator_api::{auto_if_empty, inventory, IdName};
use netris_operator_core::{
    kubernetes::operations::patch_resource_merge,
    resources::crd::v1alpha1::{
        controller::{Controller, ControllerMeta, ControllerMetaSpec},
        ResourceStatus,
    },
};
use serde_json::json;

use crate::{
    controller::{
        context::ReconcilerContext,
        error::ReconcilerError,
        sync::{ProvisionState, SyncKind, SyncOutcome},
        RequireMetadata,
    },
    storage::Storage,
};

use super::{added_id, ensure_ok};

const HW_TYPE: &str = "controller";

pub struct ControllerSync;

#[async_trait]
impl SyncKind for ControllerSync {
    type Resource = Controller;
    type Meta = ControllerMeta;
    type MetaSpec = ControllerMetaSpec;
    type Id = u32;
    type Remote = inventory::HwItem;
    type Status = ResourceStatus;

    const KIND: &'static str = "Controller";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Controller,
    ) -> Result<ControllerMetaSpec, ReconcilerError> {
        translate_controller(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &ControllerMeta,
    ) -> Result<Option<inventory::HwItem>, ReconcilerError> {
        Ok(context
            .storage
            .inventory
            .find(|item| item.hw_type == HW_TYPE && item.name == meta.spec.controller_name)
            .await)
    }

    fn remote_id(remote: &inventory::HwItem) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &ControllerMeta,
    ) -> Result<Option<inventory::HwItem>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .inventory
            .find_refreshed(
                |item| item.hw_type == HW_TYPE && item.id == id,
                || context.netris.list_inventory(),
            )
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &ControllerMeta,
    ) -> Result<u32, ReconcilerError> {
        let payload = inventory::ControllerAdd {
            hw_type: HW_TYPE.to_owned(),
            name: meta.spec.controller_name.clone(),
            description: meta.spec.description.clone(),
            tenant: IdName::id(meta.spec.tenant_id),
            site: IdName::id(meta.spec.site_id),
            main_address: auto_if_empty(&meta.spec.main_ip),
        };

        added_id(context.netris.add_inventory(&payload).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &ControllerMeta,
        _current: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        let payload = inventory::ControllerUpdate {
            name: meta.spec.controller_name.clone(),
            description: meta.spec.description.clone(),
            main_address: auto_if_empty(&meta.spec.main_ip),
        };

        ensure_ok(context.netris.update_inventory(meta.spec.id, &payload).await?)
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &ControllerMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_inventory(HW_TYPE, meta.spec.id).await?)
    }

    /// Tenant and site are fixed at registration, so only the mutable
    /// fields count as drift.
    fn differs(spec: &ControllerMetaSpec, remote: &inventory::HwItem) -> bool {
        remote.name != spec.controller_name
            || remote.description != spec.description
            || remote.main_ip.address != spec.main_ip
    }

    async fn backfill(
        context: &ReconcilerContext,
        resource: &Controller,
        remote: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        let blank = resource.spec.main_ip.as_deref().unwrap_or_default().is_empty();
        if !blank || remote.main_ip.address.is_empty() {
            return Ok(());
        }

        patch_resource_merge::<Controller>(
            &context.client,
            resource.require_name()?,
            resource.require_namespace()?,
            &json!({"spec": {"mainIp": remote.main_ip.address}}),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

        Ok(())
    }

    fn provision_state(_remote: &inventory::HwItem) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, inventory::HwItem>) -> ResourceStatus {
        outcome.resource_status()
    }
}

async fn translate_controller(
    storage: &Storage,
    resource: &Controller,
) -> Result<ControllerMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let site = storage
        .sites
        .find(|site| site.name == spec.site)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("invalid site '{}'", spec.site).into())
        })?;

    let tenant = storage
        .tenants
        .find(|tenant| tenant.name == spec.tenant)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("invalid tenant '{}'", spec.tenant).into())
        })?;

    Ok(ControllerMetaSpec {
        controller_name: resource.require_name()?.to_owned(),
        tenant_id: tenant.id,
        description: spec.description.clone().unwrap_or_default(),
        site_id: site.id,
        main_ip: spec.main_ip.clone().unwrap_or_default(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{sites::Site, tenants::Tenant};
    use netris_operator_core::resources::crd::v1alpha1::controller::ControllerSpec;

    use super::*;

    #[tokio::test]
    async fn translation_resolves_site_and_tenant() {
        let storage = Storage::new();
        storage
            .sites
            .replace(vec![Site {
                id: 1,
                name: "yerevan".to_owned(),
                ..Default::default()
            }])
            .await;
        storage
            .tenants
            .replace(vec![Tenant {
                id: 2,
                name: "Admin".to_owned(),
            }])
            .await;

        let controller = Controller::new(
            "ctl-1",
            ControllerSpec {
                tenant: "Admin".to_owned(),
                site: "yerevan".to_owned(),
                ..Default::default()
            },
        );

        let spec = translate_controller(&storage, &controller).await.unwrap();
        assert_eq!((spec.site_id, spec.tenant_id), (1, 2));

        let mut missited = controller;
        missited.spec.site = "gyumri".to_owned();
        let error = translate_controller(&storage, &missited).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid site 'gyumri'");
    }

    #[test]
    fn registration_fields_are_not_drift() {
        let spec = ControllerMetaSpec {
            controller_name: "ctl-1".to_owned(),
            tenant_id: 2,
            site_id: 1,
            main_ip: "10.254.46.3".to_owned(),
            ..Default::default()
        };

        let mut remote = inventory::HwItem {
            name: "ctl-1".to_owned(),
            tenant: IdName::id(9),
            site: IdName::id(9),
            main_ip: inventory::Address {
                address: "10.254.46.3".to_owned(),
            },
            ..Default::default()
        };
        assert!(!ControllerSync::differs(&spec, &remote));

        remote.main_ip.address = "10.254.46.4".to_owned();
        assert!(ControllerSync::differs(&spec, &remote));
    }
}

use async_trait::async_trait;
use netris_operator_api::{auto_if_empty, inventory, IdName};
use netris_operator_core::{
    kubernetes::operations::patch_resource_merge,
    resources::crd::v1alpha1::{
        softgate::{Softgate, SoftgateMeta, SoftgateMetaSpec},
        ResourceStatus,
    },
};
use serde_json::{json, Map, Value};

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

const HW_TYPE: &str = "softgate";

pub struct SoftgateSync;

#[async_trait]
impl SyncKind for SoftgateSync {
    type Resource = Softgate;
    type Meta = SoftgateMeta;
    type MetaSpec = SoftgateMetaSpec;
    type Id = u32;
    type Remote = inventory::HwItem;
    type Status = ResourceStatus;

    const KIND: &'static str = "Softgate";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Softgate,
    ) -> Result<SoftgateMetaSpec, ReconcilerError> {
        translate_softgate(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &SoftgateMeta,
    ) -> Result<Option<inventory::HwItem>, ReconcilerError> {
        Ok(context
            .storage
            .inventory
            .find(|item| item.hw_type == HW_TYPE && item.name == meta.spec.softgate_name)
            .await)
    }

    fn remote_id(remote: &inventory::HwItem) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &SoftgateMeta,
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
        meta: &SoftgateMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_inventory(&softgate_add(&meta.spec))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &SoftgateMeta,
        _current: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_inventory(meta.spec.id, &softgate_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &SoftgateMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_inventory(HW_TYPE, meta.spec.id).await?)
    }

    fn differs(spec: &SoftgateMetaSpec, remote: &inventory::HwItem) -> bool {
        remote.name != spec.softgate_name
            || remote.description != spec.description
            || remote.tenant.id != spec.tenant_id
            || remote.site.id != spec.site_id
            || remote.profile.id != spec.profile_id
            || remote.main_ip.address != spec.main_ip
            || remote.mgmt_ip.address != spec.mgmt_ip
    }

    async fn backfill(
        context: &ReconcilerContext,
        resource: &Softgate,
        remote: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        let assigned = assigned_values(resource, remote);
        if assigned.is_empty() {
            return Ok(());
        }

        patch_resource_merge::<Softgate>(
            &context.client,
            resource.require_name()?,
            resource.require_namespace()?,
            &json!({"spec": assigned}),
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

async fn translate_softgate(
    storage: &Storage,
    resource: &Softgate,
) -> Result<SoftgateMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let site = storage
        .sites
        .find(|site| site.name == spec.site)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Invalid site '{}'", spec.site).into())
        })?;

    let tenant = storage
        .tenants
        .find(|tenant| tenant.name == spec.tenant)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Invalid tenant '{}'", spec.tenant).into())
        })?;

    // softgates always run a profile, unlike switches
    let profile_name = spec.profile.clone().unwrap_or_default();
    let profile = storage
        .profiles
        .find(|profile| profile.name == profile_name)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Invalid profile '{profile_name}'").into())
        })?;

    Ok(SoftgateMetaSpec {
        softgate_name: resource.require_name()?.to_owned(),
        tenant_id: tenant.id,
        description: spec.description.clone().unwrap_or_default(),
        site_id: site.id,
        profile_id: profile.id,
        main_ip: spec.main_ip.clone().unwrap_or_default(),
        mgmt_ip: spec.mgmt_ip.clone().unwrap_or_default(),
        ..Default::default()
    })
}

fn softgate_add(spec: &SoftgateMetaSpec) -> inventory::SoftgateAdd {
    inventory::SoftgateAdd {
        hw_type: HW_TYPE.to_owned(),
        name: spec.softgate_name.clone(),
        description: spec.description.clone(),
        tenant: IdName::id(spec.tenant_id),
        site: IdName::id(spec.site_id),
        profile: IdName::id(spec.profile_id),
        main_address: auto_if_empty(&spec.main_ip),
        mgmt_address: auto_if_empty(&spec.mgmt_ip),
    }
}

fn assigned_values(resource: &Softgate, remote: &inventory::HwItem) -> Map<String, Value> {
    let spec = &resource.spec;
    let mut assigned = Map::new();

    if spec.main_ip.as_deref().unwrap_or_default().is_empty()
        && !remote.main_ip.address.is_empty()
    {
        assigned.insert("mainIp".to_owned(), json!(remote.main_ip.address));
    }
    if spec.mgmt_ip.as_deref().unwrap_or_default().is_empty()
        && !remote.mgmt_ip.address.is_empty()
    {
        assigned.insert("mgmtIp".to_owned(), json!(remote.mgmt_ip.address));
    }

    assigned
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{profiles::Profile, sites::Site, tenants::Tenant};
    use netris_operator_core::resources::crd::v1alpha1::softgate::SoftgateSpec;

    use super::*;

    async fn seeded_storage() -> Storage {
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
        storage
            .profiles
            .replace(vec![Profile {
                id: 5,
                name: "border".to_owned(),
                ..Default::default()
            }])
            .await;

        storage
    }

    #[tokio::test]
    async fn translation_requires_a_profile() {
        let storage = seeded_storage().await;
        let softgate = Softgate::new(
            "sg-1",
            SoftgateSpec {
                tenant: "Admin".to_owned(),
                site: "yerevan".to_owned(),
                profile: Some("border".to_owned()),
                ..Default::default()
            },
        );

        let spec = translate_softgate(&storage, &softgate).await.unwrap();
        assert_eq!(spec.profile_id, 5);

        let mut unprofiled = softgate;
        unprofiled.spec.profile = None;
        let error = translate_softgate(&storage, &unprofiled).await.unwrap_err();
        assert_eq!(error.to_string(), "Invalid profile ''");
    }

    #[test]
    fn payload_turns_blank_addresses_into_auto() {
        let payload = softgate_add(&SoftgateMetaSpec {
            softgate_name: "sg-1".to_owned(),
            tenant_id: 2,
            site_id: 1,
            profile_id: 5,
            mgmt_ip: "172.16.0.4".to_owned(),
            ..Default::default()
        });

        assert_eq!(payload.main_address, "auto");
        assert_eq!(payload.mgmt_address, "172.16.0.4");
    }
}

use async_trait::async_trait;
use netris_operator_api::{auto_if_empty, inventory, nos::Nos, IdName, NumberOrAuto};
use netris_operator_core::{
    kubernetes::operations::patch_resource_merge,
    resources::crd::v1alpha1::{
        switch::{Switch, SwitchMeta, SwitchMetaSpec, SwitchNos},
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

const HW_TYPE: &str = "switch";

pub struct SwitchSync;

#[async_trait]
impl SyncKind for SwitchSync {
    type Resource = Switch;
    type Meta = SwitchMeta;
    type MetaSpec = SwitchMetaSpec;
    type Id = u32;
    type Remote = inventory::HwItem;
    type Status = ResourceStatus;

    const KIND: &'static str = "Switch";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Switch,
    ) -> Result<SwitchMetaSpec, ReconcilerError> {
        translate_switch(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &SwitchMeta,
    ) -> Result<Option<inventory::HwItem>, ReconcilerError> {
        Ok(context
            .storage
            .inventory
            .find(|item| item.hw_type == HW_TYPE && item.name == meta.spec.switch_name)
            .await)
    }

    fn remote_id(remote: &inventory::HwItem) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &SwitchMeta,
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
        meta: &SwitchMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_inventory(&switch_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &SwitchMeta,
        _current: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        // registration owns the MAC; updates never resend it
        let mut payload = switch_add(&meta.spec);
        payload.mac_address = String::new();

        ensure_ok(context.netris.update_inventory(meta.spec.id, &payload).await?)
    }

    async fn delete(context: &ReconcilerContext, meta: &SwitchMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_inventory(HW_TYPE, meta.spec.id).await?)
    }

    fn differs(spec: &SwitchMetaSpec, remote: &inventory::HwItem) -> bool {
        remote.name != spec.switch_name
            || remote.description != spec.description
            || remote.tenant.id != spec.tenant_id
            || remote.site.id != spec.site_id
            || remote.nos.tag != spec.nos.tag
            || remote.asn != spec.asn
            || remote.port_count != spec.ports_count
            || remote.mac_address != spec.mac_address
            || remote.profile.id != spec.profile_id
            || remote.main_ip.address != spec.main_ip
            || remote.mgmt_ip.address != spec.mgmt_ip
    }

    async fn backfill(
        context: &ReconcilerContext,
        resource: &Switch,
        remote: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        let assigned = assigned_values(resource, remote);
        if assigned.is_empty() {
            return Ok(());
        }

        patch_resource_merge::<Switch>(
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

async fn translate_switch(
    storage: &Storage,
    resource: &Switch,
) -> Result<SwitchMetaSpec, ReconcilerError> {
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

    let mut profile_id = 0;
    if let Some(profile_name) = spec.profile.as_deref().filter(|name| !name.is_empty()) {
        profile_id = storage
            .profiles
            .find(|profile| profile.name == profile_name)
            .await
            .map(|profile| profile.id)
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("invalid profile '{profile_name}'").into())
            })?;
    }

    // an unknown tag stays a blank record; the controller rejects the payload
    let nos = storage
        .nos
        .find(|nos| nos.tag == spec.nos.as_str())
        .await
        .unwrap_or_default();

    Ok(SwitchMetaSpec {
        switch_name: resource.require_name()?.to_owned(),
        tenant_id: tenant.id,
        description: spec.description.clone().unwrap_or_default(),
        nos: SwitchNos {
            id: nos.id,
            name: nos.name,
            tag: nos.tag,
        },
        site_id: site.id,
        asn: spec.asn.unwrap_or_default(),
        profile_id,
        main_ip: spec.main_ip.clone().unwrap_or_default(),
        mgmt_ip: spec.mgmt_ip.clone().unwrap_or_default(),
        ports_count: spec.ports_count.as_u32(),
        mac_address: spec.mac_address.clone().unwrap_or_default(),
        ..Default::default()
    })
}

fn switch_add(spec: &SwitchMetaSpec) -> inventory::SwitchAdd {
    inventory::SwitchAdd {
        hw_type: HW_TYPE.to_owned(),
        name: spec.switch_name.clone(),
        description: spec.description.clone(),
        tenant: IdName::id(spec.tenant_id),
        site: IdName::id(spec.site_id),
        profile: IdName::id(spec.profile_id),
        asn: NumberOrAuto::from_u32(spec.asn),
        nos: Nos {
            id: spec.nos.id,
            name: spec.nos.name.clone(),
            tag: spec.nos.tag.clone(),
        },
        main_address: auto_if_empty(&spec.main_ip),
        mgmt_address: auto_if_empty(&spec.mgmt_ip),
        port_count: spec.ports_count,
        mac_address: spec.mac_address.clone(),
    }
}

/// Parent spec fields the controller picked for us and the user left blank.
fn assigned_values(resource: &Switch, remote: &inventory::HwItem) -> Map<String, Value> {
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
    if spec.asn.unwrap_or_default() == 0 && remote.asn != 0 {
        assigned.insert("asn".to_owned(), json!(remote.asn));
    }

    assigned
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{sites::Site, tenants::Tenant};
    use netris_operator_core::resources::crd::v1alpha1::switch::{PortsCount, SwitchNosTag, SwitchSpec};

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
            .nos
            .replace(vec![Nos {
                id: 7,
                name: "Cumulus Linux".to_owned(),
                tag: "cumulus_linux".to_owned(),
            }])
            .await;

        storage
    }

    fn spine(asn: Option<u32>, main_ip: Option<&str>) -> Switch {
        Switch::new(
            "spine-1",
            SwitchSpec {
                tenant: "Admin".to_owned(),
                nos: SwitchNosTag::CumulusLinux,
                site: "yerevan".to_owned(),
                asn,
                main_ip: main_ip.map(str::to_owned),
                ports_count: PortsCount::ThirtyTwo,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn translation_embeds_the_nos_record() {
        let storage = seeded_storage().await;

        let spec = translate_switch(&storage, &spine(Some(65100), None))
            .await
            .unwrap();

        assert_eq!(spec.nos.id, 7);
        assert_eq!(spec.nos.tag, "cumulus_linux");
        assert_eq!(spec.ports_count, 32);
        assert_eq!(spec.main_ip, "");
    }

    #[tokio::test]
    async fn unknown_profiles_fail_translation() {
        let storage = seeded_storage().await;
        let mut switch = spine(None, None);
        switch.spec.profile = Some("edge".to_owned());

        let error = translate_switch(&storage, &switch).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid profile 'edge'");
    }

    #[test]
    fn payload_turns_blanks_into_auto() {
        let spec = SwitchMetaSpec {
            switch_name: "spine-1".to_owned(),
            tenant_id: 2,
            site_id: 1,
            ports_count: 32,
            ..Default::default()
        };

        let payload = switch_add(&spec);

        assert_eq!(payload.asn, NumberOrAuto::from_u32(0));
        assert_eq!(payload.main_address, "auto");
        assert_eq!(payload.mgmt_address, "auto");
    }

    #[test]
    fn backfill_only_touches_blank_fields() {
        let remote = inventory::HwItem {
            asn: 4200000031,
            main_ip: inventory::Address {
                address: "10.254.46.21".to_owned(),
            },
            mgmt_ip: inventory::Address {
                address: "172.16.0.21".to_owned(),
            },
            ..Default::default()
        };

        let assigned = assigned_values(&spine(None, None), &remote);
        assert_eq!(assigned.get("asn"), Some(&json!(4200000031u32)));
        assert_eq!(assigned.get("mainIp"), Some(&json!("10.254.46.21")));

        let assigned = assigned_values(&spine(Some(65100), Some("10.254.46.9")), &remote);
        assert!(!assigned.contains_key("asn"));
        assert!(!assigned.contains_key("mainIp"));
        assert_eq!(assigned.get("mgmtIp"), Some(&json!("172.16.0.21")));
    }
}

use async_trait::async_trait;
use itertools::Itertools;
use netris_operator_api::{auto_if_empty, inventory, IdName, NumberOrAuto};
use netris_operator_core::{
    kubernetes::operations::patch_resource_merge,
    resources::crd::v1alpha1::{
        server::{Server, ServerMeta, ServerMetaSpec},
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

const HW_TYPE: &str = "server";

pub struct ServerSync;

#[async_trait]
impl SyncKind for ServerSync {
    type Resource = Server;
    type Meta = ServerMeta;
    type MetaSpec = ServerMetaSpec;
    type Id = u32;
    type Remote = inventory::HwItem;
    type Status = ResourceStatus;

    const KIND: &'static str = "Server";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Server,
    ) -> Result<ServerMetaSpec, ReconcilerError> {
        translate_server(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &ServerMeta,
    ) -> Result<Option<inventory::HwItem>, ReconcilerError> {
        Ok(context
            .storage
            .inventory
            .find(|item| item.hw_type == HW_TYPE && item.name == meta.spec.server_name)
            .await)
    }

    fn remote_id(remote: &inventory::HwItem) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &ServerMeta,
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
        meta: &ServerMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_inventory(&server_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &ServerMeta,
        _current: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_inventory(meta.spec.id, &server_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &ServerMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_inventory(HW_TYPE, meta.spec.id).await?)
    }

    /// Servers carry a lot of controller-populated detail; anything the spec
    /// leaves unset is the controller's to fill and never counts as drift.
    fn differs(spec: &ServerMetaSpec, remote: &inventory::HwItem) -> bool {
        let profile_differs = remote.profile.id != 0 && remote.profile.id != spec.profile_id;
        let uuid_differs = !spec.uuid.is_empty() && remote.uuid != spec.uuid;
        let role_differs = !spec.srv_role.is_empty() && remote.srv_role != spec.srv_role;
        let asn_differs = spec.asn != 0 && remote.asn != spec.asn;
        let ports_differ = spec.port_count != 0 && remote.port_count != spec.port_count;
        let data_differs = !spec.custom_data.is_empty() && remote.custom_data != spec.custom_data;
        let tags_differ = !spec
            .tags
            .iter()
            .sorted()
            .eq(remote.tags.iter().sorted());

        remote.name != spec.server_name
            || remote.description != spec.description
            || remote.tenant.id != spec.tenant_id
            || remote.site.id != spec.site_id
            || profile_differs
            || remote.main_ip.address != spec.main_ip
            || remote.mgmt_ip.address != spec.mgmt_ip
            || uuid_differs
            || role_differs
            || asn_differs
            || ports_differ
            || data_differs
            || tags_differ
    }

    async fn backfill(
        context: &ReconcilerContext,
        resource: &Server,
        remote: &inventory::HwItem,
    ) -> Result<(), ReconcilerError> {
        let assigned = assigned_values(resource, remote);
        if assigned.is_empty() {
            return Ok(());
        }

        patch_resource_merge::<Server>(
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

async fn translate_server(
    storage: &Storage,
    resource: &Server,
) -> Result<ServerMetaSpec, ReconcilerError> {
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

    Ok(ServerMetaSpec {
        server_name: resource.require_name()?.to_owned(),
        tenant_id: tenant.id,
        description: spec.description.clone().unwrap_or_default(),
        site_id: site.id,
        profile_id,
        main_ip: spec.main_ip.clone().unwrap_or_default(),
        mgmt_ip: spec.mgmt_ip.clone().unwrap_or_default(),
        uuid: spec.uuid.clone().unwrap_or_default(),
        asn: spec.asn.unwrap_or_default(),
        port_count: spec.port_count.unwrap_or_default(),
        custom_data: spec.custom_data.clone().unwrap_or_default(),
        tags: spec.tags.clone(),
        srv_role: spec.srv_role.clone().unwrap_or_default(),
        ..Default::default()
    })
}

fn server_add(spec: &ServerMetaSpec) -> inventory::ServerAdd {
    inventory::ServerAdd {
        hw_type: HW_TYPE.to_owned(),
        name: spec.server_name.clone(),
        description: spec.description.clone(),
        tenant: IdName::id(spec.tenant_id),
        site: IdName::id(spec.site_id),
        profile: IdName::id(spec.profile_id),
        asn: NumberOrAuto::from_u32(spec.asn),
        main_address: auto_if_empty(&spec.main_ip),
        mgmt_address: auto_if_empty(&spec.mgmt_ip),
        port_count: spec.port_count,
        uuid: spec.uuid.clone(),
        custom_data: spec.custom_data.clone(),
        tags: spec.tags.clone(),
        srv_role: spec.srv_role.clone(),
    }
}

fn assigned_values(resource: &Server, remote: &inventory::HwItem) -> Map<String, Value> {
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
    if spec.profile.as_deref().unwrap_or_default().is_empty()
        && remote.profile.id != 0
        && !remote.profile.name.is_empty()
    {
        assigned.insert("profile".to_owned(), json!(remote.profile.name));
    }

    assigned
}

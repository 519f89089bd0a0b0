use async_trait::async_trait;
use itertools::Itertools;
use netris_operator_api::{subnets, IdName};
use netris_operator_core::resources::crd::v1alpha1::{
    subnet::{Subnet, SubnetMeta, SubnetMetaSpec},
    ResourceStatus,
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

use super::{added_id, ensure_ok};

pub struct SubnetSync;

#[async_trait]
impl SyncKind for SubnetSync {
    type Resource = Subnet;
    type Meta = SubnetMeta;
    type MetaSpec = SubnetMetaSpec;
    type Id = u32;
    type Remote = subnets::Subnet;
    type Status = ResourceStatus;

    const KIND: &'static str = "Subnet";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Subnet,
    ) -> Result<SubnetMetaSpec, ReconcilerError> {
        translate_subnet(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &SubnetMeta,
    ) -> Result<Option<subnets::Subnet>, ReconcilerError> {
        Ok(context
            .storage
            .subnets
            .find(|subnet| subnet.name == meta.spec.subnet_name)
            .await)
    }

    fn remote_id(remote: &subnets::Subnet) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &SubnetMeta,
    ) -> Result<Option<subnets::Subnet>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .subnets
            .find_refreshed(|subnet| subnet.id == id, || context.netris.list_subnets())
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &SubnetMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_subnet(&subnet_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &SubnetMeta,
        _current: &subnets::Subnet,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_subnet(meta.spec.id, &subnet_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &SubnetMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_subnet(meta.spec.id).await?)
    }

    fn differs(spec: &SubnetMetaSpec, remote: &subnets::Subnet) -> bool {
        let sites_differ = !spec
            .sites
            .iter()
            .copied()
            .sorted()
            .eq(remote.sites.iter().map(|site| site.id).sorted());

        remote.name != spec.subnet_name
            || remote.prefix != spec.prefix
            || remote.purpose != spec.purpose
            || remote.default_gateway != spec.default_gateway.as_deref().unwrap_or_default()
            || sites_differ
    }

    fn provision_state(_remote: &subnets::Subnet) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, subnets::Subnet>) -> ResourceStatus {
        outcome.resource_status()
    }
}

async fn translate_subnet(
    storage: &Storage,
    resource: &Subnet,
) -> Result<SubnetMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let mut sites = Vec::with_capacity(spec.sites.len());
    for name in &spec.sites {
        let site = storage
            .sites
            .find(|site| &site.name == name)
            .await
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("invalid site '{name}'").into())
            })?;
        sites.push(site.id);
    }

    let tenant = storage
        .tenants
        .find(|tenant| tenant.name == spec.tenant)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("invalid tenant '{}'", spec.tenant).into())
        })?;

    Ok(SubnetMetaSpec {
        subnet_name: resource.require_name()?.to_owned(),
        prefix: spec.prefix.clone(),
        tenant_id: tenant.id,
        purpose: spec.purpose.clone(),
        default_gateway: spec.default_gateway.clone(),
        sites,
        ..Default::default()
    })
}

fn subnet_add(spec: &SubnetMetaSpec) -> subnets::SubnetAdd {
    subnets::SubnetAdd {
        name: spec.subnet_name.clone(),
        prefix: spec.prefix.clone(),
        tenant: IdName::id(spec.tenant_id),
        purpose: spec.purpose.clone(),
        default_gateway: spec.default_gateway.clone().unwrap_or_default(),
        sites: spec.sites.iter().copied().map(IdName::id).collect(),
    }
}

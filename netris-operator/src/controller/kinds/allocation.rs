use async_trait::async_trait;
use netris_operator_api::{allocations, IdName};
use netris_operator_core::resources::crd::v1alpha1::{
    allocation::{Allocation, AllocationMeta, AllocationMetaSpec},
    ResourceStatus,
};

use crate::controller::{
    context::ReconcilerContext,
    error::ReconcilerError,
    sync::{ProvisionState, SyncKind, SyncOutcome},
    RequireMetadata,
};

use super::{added_id, ensure_ok};

pub struct AllocationSync;

#[async_trait]
impl SyncKind for AllocationSync {
    type Resource = Allocation;
    type Meta = AllocationMeta;
    type MetaSpec = AllocationMetaSpec;
    type Id = u32;
    type Remote = allocations::Allocation;
    type Status = ResourceStatus;

    const KIND: &'static str = "Allocation";

    async fn translate(
        _context: &ReconcilerContext,
        resource: &Allocation,
    ) -> Result<AllocationMetaSpec, ReconcilerError> {
        Ok(AllocationMetaSpec {
            allocation_name: resource.require_name()?.to_owned(),
            prefix: resource.spec.prefix.clone(),
            tenant: resource.spec.tenant.clone(),
            ..Default::default()
        })
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &AllocationMeta,
    ) -> Result<Option<allocations::Allocation>, ReconcilerError> {
        Ok(context
            .storage
            .allocations
            .find(|allocation| allocation.name == meta.spec.allocation_name)
            .await)
    }

    fn remote_id(remote: &allocations::Allocation) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &AllocationMeta,
    ) -> Result<Option<allocations::Allocation>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .allocations
            .find_refreshed(
                |allocation| allocation.id == id,
                || context.netris.list_allocations(),
            )
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &AllocationMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_allocation(&allocation_add(&meta.spec))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &AllocationMeta,
        _current: &allocations::Allocation,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_allocation(meta.spec.id, &allocation_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &AllocationMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_allocation(meta.spec.id).await?)
    }

    // the tenant reference is not reported back, so only name and prefix can
    // drift
    fn differs(spec: &AllocationMetaSpec, remote: &allocations::Allocation) -> bool {
        remote.name != spec.allocation_name || remote.prefix != spec.prefix
    }

    fn provision_state(_remote: &allocations::Allocation) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, allocations::Allocation>) -> ResourceStatus {
        outcome.resource_status()
    }
}

/// Tenants travel by name here; the controller resolves them on its side.
fn allocation_add(spec: &AllocationMetaSpec) -> allocations::AllocationAdd {
    allocations::AllocationAdd {
        name: spec.allocation_name.clone(),
        prefix: spec.prefix.clone(),
        tenant: IdName::named(0, &spec.tenant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated() -> AllocationMetaSpec {
        AllocationMetaSpec {
            allocation_name: "k8s-pods".to_owned(),
            prefix: "10.244.0.0/16".to_owned(),
            tenant: "Admin".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn payload_sends_the_tenant_by_name() {
        let payload = serde_json::to_value(allocation_add(&translated())).unwrap();

        assert_eq!(payload["tenant"], serde_json::json!({"name": "Admin"}));
        assert_eq!(payload["prefix"], "10.244.0.0/16");
    }

    #[test]
    fn only_name_and_prefix_count_as_drift() {
        let spec = translated();

        let remote = allocations::Allocation {
            id: 3,
            name: "k8s-pods".to_owned(),
            prefix: "10.244.0.0/16".to_owned(),
            tenant: IdName::named(1, "somebody-else"),
            ..Default::default()
        };
        assert!(!AllocationSync::differs(&spec, &remote));

        let mut renamed = remote;
        renamed.prefix = "10.245.0.0/16".to_owned();
        assert!(AllocationSync::differs(&spec, &renamed));
    }
}

use std::sync::Arc;

use futures::future::join_all;
use kube::Resource;
use tokio::spawn;

use self::{
    context::ReconcilerContext,
    error::ReconcilerError,
    kinds::{
        allocation::AllocationSync, bgp::BGPSync, controller::ControllerSync, ebgp::EBGPSync,
        inventory_profile::InventoryProfileSync, l4lb::L4LBSync, link::LinkSync, nat::NatSync,
        server::ServerSync, server_cluster::ServerClusterSync,
        server_cluster_template::ServerClusterTemplateSync, site::SiteSync,
        softgate::SoftgateSync, subnet::SubnetSync, switch::SwitchSync, vnet::VNetSync,
        vpc::VPCSync,
    },
    sync::{start_meta_controller, start_resource_controller},
};

pub mod context;
pub mod error;
pub mod kinds;
pub mod sync;

pub trait RequireMetadata {
    fn require_name(&self) -> Result<&str, ReconcilerError>;
    fn require_namespace(&self) -> Result<&str, ReconcilerError>;
}

impl<T: Resource> RequireMetadata for T {
    fn require_name(&self) -> Result<&str, ReconcilerError> {
        Ok(self
            .meta()
            .name
            .as_ref()
            .ok_or(ReconcilerError::MissingObjectMetadata)?
            .as_str())
    }

    fn require_namespace(&self) -> Result<&str, ReconcilerError> {
        Ok(self
            .meta()
            .namespace
            .as_ref()
            .ok_or(ReconcilerError::MissingObjectMetadata)?
            .as_str())
    }
}

/// Spawns a resource and a meta controller for every kind and runs them
/// until shutdown.
pub async fn start_controllers(context: Arc<ReconcilerContext>) {
    let handles = vec![
        spawn(start_resource_controller::<AllocationSync>(context.clone())),
        spawn(start_meta_controller::<AllocationSync>(context.clone())),
        spawn(start_resource_controller::<BGPSync>(context.clone())),
        spawn(start_meta_controller::<BGPSync>(context.clone())),
        spawn(start_resource_controller::<ControllerSync>(context.clone())),
        spawn(start_meta_controller::<ControllerSync>(context.clone())),
        spawn(start_resource_controller::<EBGPSync>(context.clone())),
        spawn(start_meta_controller::<EBGPSync>(context.clone())),
        spawn(start_resource_controller::<InventoryProfileSync>(context.clone())),
        spawn(start_meta_controller::<InventoryProfileSync>(context.clone())),
        spawn(start_resource_controller::<L4LBSync>(context.clone())),
        spawn(start_meta_controller::<L4LBSync>(context.clone())),
        spawn(start_resource_controller::<LinkSync>(context.clone())),
        spawn(start_meta_controller::<LinkSync>(context.clone())),
        spawn(start_resource_controller::<NatSync>(context.clone())),
        spawn(start_meta_controller::<NatSync>(context.clone())),
        spawn(start_resource_controller::<ServerSync>(context.clone())),
        spawn(start_meta_controller::<ServerSync>(context.clone())),
        spawn(start_resource_controller::<ServerClusterSync>(context.clone())),
        spawn(start_meta_controller::<ServerClusterSync>(context.clone())),
        spawn(start_resource_controller::<ServerClusterTemplateSync>(context.clone())),
        spawn(start_meta_controller::<ServerClusterTemplateSync>(context.clone())),
        spawn(start_resource_controller::<SiteSync>(context.clone())),
        spawn(start_meta_controller::<SiteSync>(context.clone())),
        spawn(start_resource_controller::<SoftgateSync>(context.clone())),
        spawn(start_meta_controller::<SoftgateSync>(context.clone())),
        spawn(start_resource_controller::<SubnetSync>(context.clone())),
        spawn(start_meta_controller::<SubnetSync>(context.clone())),
        spawn(start_resource_controller::<SwitchSync>(context.clone())),
        spawn(start_meta_controller::<SwitchSync>(context.clone())),
        spawn(start_resource_controller::<VNetSync>(context.clone())),
        spawn(start_meta_controller::<VNetSync>(context.clone())),
        spawn(start_resource_controller::<VPCSync>(context.clone())),
        spawn(start_meta_controller::<VPCSync>(context.clone())),
    ];

    join_all(handles).await;
}

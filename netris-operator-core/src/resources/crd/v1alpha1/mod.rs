use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub mod allocation;
pub mod bgp;
pub mod controller;
pub mod ebgp;
pub mod inventory_profile;
pub mod l4lb;
pub mod link;
pub mod nat;
pub mod server;
pub mod server_cluster;
pub mod server_cluster_template;
pub mod site;
pub mod softgate;
pub mod subnet;
pub mod switch;
pub mod vnet;
pub mod vpc;

/// Observed provisioning state, shared by the kinds that report only the
/// status/message pair.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct ResourceStatus {
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Every CRD served by the operator, user kinds along with their Meta twins.
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        allocation::Allocation::crd(),
        allocation::AllocationMeta::crd(),
        bgp::BGP::crd(),
        bgp::BGPMeta::crd(),
        controller::Controller::crd(),
        controller::ControllerMeta::crd(),
        ebgp::EBGP::crd(),
        ebgp::EBGPMeta::crd(),
        inventory_profile::InventoryProfile::crd(),
        inventory_profile::InventoryProfileMeta::crd(),
        l4lb::L4LB::crd(),
        l4lb::L4LBMeta::crd(),
        link::Link::crd(),
        link::LinkMeta::crd(),
        nat::Nat::crd(),
        nat::NatMeta::crd(),
        server::Server::crd(),
        server::ServerMeta::crd(),
        server_cluster::ServerCluster::crd(),
        server_cluster::ServerClusterMeta::crd(),
        server_cluster_template::ServerClusterTemplate::crd(),
        server_cluster_template::ServerClusterTemplateMeta::crd(),
        site::Site::crd(),
        site::SiteMeta::crd(),
        softgate::Softgate::crd(),
        softgate::SoftgateMeta::crd(),
        subnet::Subnet::crd(),
        subnet::SubnetMeta::crd(),
        switch::Switch::crd(),
        switch::SwitchMeta::crd(),
        vnet::VNet::crd(),
        vnet::VNetMeta::crd(),
        vpc::VPC::crd(),
        vpc::VPCMeta::crd(),
    ]
}

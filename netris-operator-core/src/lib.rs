pub mod config;
pub mod helpers;
pub mod ip;
pub mod kubernetes;
pub mod resources;

pub const RESOURCE_GROUP: &str = "k8s.netris.ai";
pub const RESOURCE_VERSION: &str = "v1alpha1";

/// Field manager recorded by server-side apply patches.
pub const FIELD_MANAGER: &str = "netris-operator";

/// Finalizer guarding remote cleanup, shared by every kind.
pub const DELETE_FINALIZER: &str = "resource.k8s.netris.ai/delete";

use std::sync::Arc;

use kube::{Api, Client, Resource};
use netris_operator_core::config::OperatorConfig;

use crate::storage::Storage;

pub struct ReconcilerContext {
    pub config: OperatorConfig,
    pub client: Client,
    pub netris: Arc<netris_operator_api::Client>,
    pub storage: Arc<Storage>,
}

impl ReconcilerContext {
    /// Cluster-wide API handle; the operator watches every namespace.
    pub fn all_api<T>(&self) -> Api<T>
    where
        T: Resource<DynamicType = ()>,
    {
        Api::all(self.client.clone())
    }
}

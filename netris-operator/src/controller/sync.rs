use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::{
    serde::{de::DeserializeOwned, Serialize},
    NamespaceResourceScope,
};
use kube::{
    api::{DeleteParams, PatchParams, PostParams},
    core::object::{HasSpec, HasStatus},
    runtime::{controller::Action, watcher::Config, Controller},
    Client, Resource, ResourceExt,
};
use log::{info, warn};
use netris_operator_core::{
    kubernetes::operations::{
        apply_resource, apply_resource_status, create_resource, delete_resource,
        patch_resource_merge, try_get_resource,
    },
    resources::{
        annotations::{annotations_need_defaults, default_annotations, imported, reclaim},
        crd::v1alpha1::ResourceStatus,
        meta::{RemoteId, ResolvedSpec},
        MESSAGE_SUCCESS, STATUS_ACTIVE, STATUS_FAILURE, STATUS_PROVISIONING,
    },
    DELETE_FINALIZER, FIELD_MANAGER,
};
use serde_json::json;

use super::{context::ReconcilerContext, error::ReconcilerError, RequireMetadata};

/// Remote provisioning state as reported by the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProvisionState {
    Active,
    Provisioning,
}

/// What a reconciliation pass concluded about a kind's remote object; turned
/// into the parent resource's status by [`SyncKind::status`].
pub enum SyncOutcome<'a, R> {
    /// The remote object exists and matches the translated spec.
    Synced {
        state: ProvisionState,
        remote: &'a R,
    },
    /// The remote object was just created and isn't readable yet.
    Pending,
    Failed {
        message: String,
    },
}

impl<R> SyncOutcome<'_, R> {
    /// The plain status/message pair most kinds report.
    pub fn resource_status(&self) -> ResourceStatus {
        let (status, message) = match self {
            SyncOutcome::Synced {
                state: ProvisionState::Active,
                ..
            } => (STATUS_ACTIVE, MESSAGE_SUCCESS.to_owned()),
            SyncOutcome::Synced {
                state: ProvisionState::Provisioning,
                ..
            }
            | SyncOutcome::Pending => (STATUS_PROVISIONING, MESSAGE_SUCCESS.to_owned()),
            SyncOutcome::Failed { message } => (STATUS_FAILURE, message.clone()),
        };

        ResourceStatus {
            status: Some(status.to_owned()),
            message: Some(message),
        }
    }
}

/// Everything kind-specific about syncing one CRD pair with the controller.
///
/// The generic reconcilers in this module drive these hooks; a kind supplies
/// translation, comparison, and the remote CRUD calls, and inherits the full
/// lifecycle: finalizers, provenance annotations, Meta regeneration, import
/// adoption, drift repair and status reporting.
#[async_trait]
pub trait SyncKind: Send + Sync + 'static {
    type Resource: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + HasStatus<Status = Self::Status>
        + Default
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static;
    type Meta: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + HasSpec<Spec = Self::MetaSpec>
        + Default
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static;
    type MetaSpec: ResolvedSpec<Id = Self::Id> + Clone + Send + Sync + 'static;
    type Id: RemoteId + Serialize + Send + Sync + 'static;
    type Remote: Send + Sync + 'static;
    type Status: Serialize + Clone + Debug + Send + Sync + 'static;

    const KIND: &'static str;

    /// Translates the user spec into a Meta spec, resolving names against
    /// the local caches. Generation and provenance bookkeeping is stamped by
    /// the caller afterwards.
    async fn translate(
        context: &ReconcilerContext,
        resource: &Self::Resource,
    ) -> Result<Self::MetaSpec, ReconcilerError>;

    /// Looks up an existing remote object to adopt when importing.
    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &Self::Meta,
    ) -> Result<Option<Self::Remote>, ReconcilerError>;

    fn remote_id(remote: &Self::Remote) -> Self::Id;

    /// The current remote object for the recorded ID, `None` once it's gone.
    async fn fetch(
        context: &ReconcilerContext,
        meta: &Self::Meta,
    ) -> Result<Option<Self::Remote>, ReconcilerError>;

    async fn create(
        context: &ReconcilerContext,
        meta: &Self::Meta,
    ) -> Result<Self::Id, ReconcilerError>;

    async fn update(
        context: &ReconcilerContext,
        meta: &Self::Meta,
        current: &Self::Remote,
    ) -> Result<(), ReconcilerError>;

    async fn delete(
        context: &ReconcilerContext,
        meta: &Self::Meta,
    ) -> Result<(), ReconcilerError>;

    /// Whether the remote object drifted from the translated spec.
    fn differs(spec: &Self::MetaSpec, remote: &Self::Remote) -> bool;

    /// Copies controller-assigned values back onto the parent resource once
    /// the remote object is in sync. Only the inventory kinds, whose specs
    /// admit `auto` placeholders, have anything to copy.
    async fn backfill(
        _context: &ReconcilerContext,
        _resource: &Self::Resource,
        _remote: &Self::Remote,
    ) -> Result<(), ReconcilerError> {
        Ok(())
    }

    fn provision_state(remote: &Self::Remote) -> ProvisionState;

    /// Builds the parent resource's status for an outcome.
    fn status(outcome: SyncOutcome<'_, Self::Remote>) -> Self::Status;
}

/// Reconciles a user resource against its Meta twin: stamps provenance
/// annotations and the cleanup finalizer, then creates or regenerates the
/// UID-named Meta holding the translated spec.
pub async fn reconcile_resource<K: SyncKind>(
    resource: Arc<K::Resource>,
    context: Arc<ReconcilerContext>,
) -> Result<Action, ReconcilerError> {
    match try_reconcile_resource::<K>(&resource, &context).await {
        Ok(action) => Ok(action),
        Err(error) => {
            if let (Ok(name), Ok(namespace)) =
                (resource.require_name(), resource.require_namespace())
            {
                report_failure::<K>(&context, name, namespace, &error).await;
            }

            Err(error)
        }
    }
}

pub fn resource_error_policy<K: SyncKind>(
    _resource: Arc<K::Resource>,
    _error: &ReconcilerError,
    context: Arc<ReconcilerContext>,
) -> Action {
    Action::requeue(context.config.requeue_interval())
}

async fn try_reconcile_resource<K: SyncKind>(
    resource: &K::Resource,
    context: &ReconcilerContext,
) -> Result<Action, ReconcilerError> {
    let name = resource.require_name()?.to_owned();
    let namespace = resource.require_namespace()?.to_owned();
    let meta_name = resource.uid().ok_or(ReconcilerError::MissingObjectMetadata)?;

    let meta = try_get_resource::<K::Meta>(&context.client, &meta_name, &namespace)
        .await
        .map_err(ReconcilerError::KubeApiError)?;

    if resource.meta().deletion_timestamp.is_some() {
        if let Some(meta) = &meta {
            if meta.spec().exists_remotely() && !reclaim(resource) {
                info!("Deleting '{name}' {} from the controller...", K::KIND);
                K::delete(context, meta).await?;
            }

            delete_resource::<K::Meta>(
                &context.client,
                &meta_name,
                &namespace,
                &DeleteParams::default(),
            )
            .await
            .map_err(ReconcilerError::KubeApiError)?;
        }

        let finalizers = resource
            .finalizers()
            .iter()
            .filter(|finalizer| *finalizer != DELETE_FINALIZER)
            .collect::<Vec<_>>();

        patch_resource_merge::<K::Resource>(
            &context.client,
            &name,
            &namespace,
            &json!({"metadata": {"finalizers": finalizers}}),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

        return Ok(Action::await_change());
    }

    if annotations_need_defaults(resource) {
        let annotations = default_annotations(resource);

        patch_resource_merge::<K::Resource>(
            &context.client,
            &name,
            &namespace,
            &json!({"metadata": {"annotations": annotations}}),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

        return Ok(Action::await_change());
    }

    match meta {
        Some(meta) => {
            let generation = resource.meta().generation;

            if meta
                .spec()
                .is_stale(generation, imported(resource), reclaim(resource))
            {
                info!("'{name}' {} changed, regenerating its meta...", K::KIND);

                let mut spec = translate_with_bookkeeping::<K>(context, resource).await?;
                spec.assign_remote_id(meta.spec().remote_id().clone());

                let regenerated = meta_object::<K>(&meta_name, &namespace, spec);

                // the operator owns Meta objects outright
                apply_resource(
                    &context.client,
                    &regenerated,
                    &PatchParams::apply(FIELD_MANAGER).force(),
                )
                .await
                .map_err(ReconcilerError::KubeApiError)?;
            }
        }
        None => {
            if !resource
                .finalizers()
                .iter()
                .any(|finalizer| finalizer == DELETE_FINALIZER)
            {
                let mut finalizers = resource.finalizers().to_vec();
                finalizers.push(DELETE_FINALIZER.to_owned());

                patch_resource_merge::<K::Resource>(
                    &context.client,
                    &name,
                    &namespace,
                    &json!({"metadata": {"finalizers": finalizers}}),
                )
                .await
                .map_err(ReconcilerError::KubeApiError)?;

                return Ok(Action::await_change());
            }

            let spec = translate_with_bookkeeping::<K>(context, resource).await?;
            let meta = meta_object::<K>(&meta_name, &namespace, spec);

            create_resource(&context.client, &meta, &PostParams::default())
                .await
                .map_err(ReconcilerError::KubeApiError)?;
        }
    }

    Ok(Action::requeue(context.config.requeue_interval()))
}

/// Reconciles a Meta resource against the remote collection: adopts or
/// creates the remote object, repairs drift, and reports the outcome on the
/// parent resource's status.
pub async fn reconcile_meta<K: SyncKind>(
    meta: Arc<K::Meta>,
    context: Arc<ReconcilerContext>,
) -> Result<Action, ReconcilerError> {
    match try_reconcile_meta::<K>(&meta, &context).await {
        Ok(action) => Ok(action),
        Err(error) => {
            if let Ok(namespace) = meta.require_namespace() {
                report_failure::<K>(&context, meta.spec().parent_name(), namespace, &error).await;
            }

            Err(error)
        }
    }
}

pub fn meta_error_policy<K: SyncKind>(
    _meta: Arc<K::Meta>,
    _error: &ReconcilerError,
    context: Arc<ReconcilerContext>,
) -> Action {
    Action::requeue(context.config.requeue_interval())
}

async fn try_reconcile_meta<K: SyncKind>(
    meta: &K::Meta,
    context: &ReconcilerContext,
) -> Result<Action, ReconcilerError> {
    let meta_name = meta.require_name()?.to_owned();
    let namespace = meta.require_namespace()?.to_owned();
    let parent_name = meta.spec().parent_name().to_owned();

    if meta.meta().deletion_timestamp.is_some() {
        return Ok(Action::await_change());
    }

    // the parent's reconciler owns cleanup; a meta without a parent is about
    // to be deleted by it
    let parent = try_get_resource::<K::Resource>(&context.client, &parent_name, &namespace)
        .await
        .map_err(ReconcilerError::KubeApiError)?;
    let parent = match parent {
        Some(parent) => parent,
        None => return Ok(Action::await_change()),
    };

    if !meta.spec().exists_remotely() {
        if meta.spec().imported() {
            if let Some(remote) = K::find_by_name(context, meta).await? {
                info!("Adopting '{parent_name}' {} from the controller...", K::KIND);

                patch_id::<K>(&context.client, &meta_name, &namespace, K::remote_id(&remote))
                    .await?;

                return Ok(Action::requeue(context.config.requeue_interval()));
            }
        }

        info!("Creating '{parent_name}' {} on the controller...", K::KIND);

        let id = K::create(context, meta).await?;
        patch_id::<K>(&context.client, &meta_name, &namespace, id).await?;
        apply_status::<K>(context, K::status(SyncOutcome::Pending), &parent_name, &namespace)
            .await?;

        return Ok(Action::requeue(context.config.requeue_interval()));
    }

    match K::fetch(context, meta).await? {
        None => {
            info!(
                "'{parent_name}' {} disappeared from the controller, recreating...",
                K::KIND
            );

            let id = K::create(context, meta).await?;
            patch_id::<K>(&context.client, &meta_name, &namespace, id).await?;
            apply_status::<K>(context, K::status(SyncOutcome::Pending), &parent_name, &namespace)
                .await?;
        }
        Some(remote) => {
            if K::differs(meta.spec(), &remote) {
                info!("'{parent_name}' {} drifted, updating the controller...", K::KIND);

                K::update(context, meta, &remote).await?;
            }

            K::backfill(context, &parent, &remote).await?;

            let outcome = SyncOutcome::Synced {
                state: K::provision_state(&remote),
                remote: &remote,
            };
            apply_status::<K>(context, K::status(outcome), &parent_name, &namespace).await?;
        }
    }

    Ok(Action::requeue(context.config.requeue_interval()))
}

async fn translate_with_bookkeeping<K: SyncKind>(
    context: &ReconcilerContext,
    resource: &K::Resource,
) -> Result<K::MetaSpec, ReconcilerError> {
    let mut spec = K::translate(context, resource).await?;

    spec.record_generation(resource.meta().generation.unwrap_or_default());
    spec.set_imported(imported(resource));
    spec.set_reclaim(reclaim(resource));

    Ok(spec)
}

fn meta_object<K: SyncKind>(name: &str, namespace: &str, spec: K::MetaSpec) -> K::Meta {
    let mut meta = K::Meta::default();

    meta.meta_mut().name = Some(name.to_owned());
    meta.meta_mut().namespace = Some(namespace.to_owned());
    *meta.spec_mut() = spec;

    meta
}

async fn patch_id<K: SyncKind>(
    client: &Client,
    meta_name: &str,
    namespace: &str,
    id: K::Id,
) -> Result<(), ReconcilerError> {
    patch_resource_merge::<K::Meta>(client, meta_name, namespace, &json!({"spec": {"id": id}}))
        .await
        .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

async fn apply_status<K: SyncKind>(
    context: &ReconcilerContext,
    status: K::Status,
    parent_name: &str,
    namespace: &str,
) -> Result<(), ReconcilerError> {
    apply_resource_status::<K::Resource, K::Status>(
        &context.client,
        status,
        parent_name,
        namespace,
        &PatchParams::apply(FIELD_MANAGER),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

/// Best-effort failure report; the reconciliation error itself is what gets
/// propagated.
async fn report_failure<K: SyncKind>(
    context: &ReconcilerContext,
    parent_name: &str,
    namespace: &str,
    error: &ReconcilerError,
) {
    let status = K::status(SyncOutcome::Failed {
        message: error.to_string(),
    });

    if let Err(patch_error) = apply_resource_status::<K::Resource, K::Status>(
        &context.client,
        status,
        parent_name,
        namespace,
        &PatchParams::apply(FIELD_MANAGER),
    )
    .await
    {
        warn!("Couldn't report a failure on '{parent_name}': {patch_error}");
    }
}

pub async fn start_resource_controller<K: SyncKind>(context: Arc<ReconcilerContext>) {
    info!("Creating {} controller...", K::KIND);

    Controller::new(context.all_api::<K::Resource>(), Config::default())
        .shutdown_on_signal()
        .run(
            reconcile_resource::<K>,
            resource_error_policy::<K>,
            context.clone(),
        )
        .for_each(|result| async move {
            match result {
                Ok(o) => info!("Reconciled {} {:?}", K::KIND, o),
                Err(e) => warn!("{} reconciliation failed: {:#?}", K::KIND, e),
            }
        })
        .await
}

pub async fn start_meta_controller<K: SyncKind>(context: Arc<ReconcilerContext>) {
    info!("Creating {} meta controller...", K::KIND);

    Controller::new(context.all_api::<K::Meta>(), Config::default())
        .shutdown_on_signal()
        .run(reconcile_meta::<K>, meta_error_policy::<K>, context.clone())
        .for_each(|result| async move {
            match result {
                Ok(o) => info!("Reconciled {} meta {:?}", K::KIND, o),
                Err(e) => warn!("{} meta reconciliation failed: {:#?}", K::KIND, e),
            }
        })
        .await
}

use std::fmt::Debug;

use anyhow::{anyhow, Context};
use k8s_openapi::{
    serde::{de::DeserializeOwned, Serialize},
    NamespaceResourceScope,
};
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    core::object::HasStatus,
    Api, Client, Resource,
};
use log::{debug, info};
use serde_json::Value;

use crate::helpers::pretty_type_name;

use super::FromStatus;

/// Fetches a namespaced resource, turning NotFound into `None`.
pub async fn try_get_resource<T>(
    client: &Client,
    name: &str,
    namespace: &str,
) -> anyhow::Result<Option<T>>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);

    resource_api.get_opt(name).await.context(format!(
        "Couldn't retrieve '{name}' {} resource from the cluster!",
        pretty_type_name::<T>()
    ))
}

/// Server-side applies a resource, creating or updating it as needed.
pub async fn apply_resource<T>(
    client: &Client,
    resource: &T,
    patch_params: &PatchParams,
) -> anyhow::Result<T>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Serialize
        + Clone
        + DeserializeOwned
        + Debug,
{
    let type_name = pretty_type_name::<T>();
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow!("{type_name} resource is missing a name!"))?;
    let namespace = resource
        .meta()
        .namespace
        .as_ref()
        .ok_or_else(|| anyhow!("'{name}' {type_name} resource is missing a namespace!"))?;

    debug!("Applying '{name}' {type_name} resource on the cluster...");

    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);
    resource_api
        .patch(name, patch_params, &Patch::Apply(resource))
        .await
        .context(format!("Unable to apply '{name}' {type_name} resource!"))
}

pub async fn create_resource<T>(
    client: &Client,
    resource: &T,
    post_params: &PostParams,
) -> anyhow::Result<T>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Serialize
        + Clone
        + DeserializeOwned
        + Debug,
{
    let type_name = pretty_type_name::<T>();
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow!("{type_name} resource is missing a name!"))?;
    let namespace = resource
        .meta()
        .namespace
        .as_ref()
        .ok_or_else(|| anyhow!("'{name}' {type_name} resource is missing a namespace!"))?;

    info!("Creating '{name}' {type_name} resource on the cluster...");

    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);
    resource_api
        .create(post_params, resource)
        .await
        .context(format!("Unable to create '{name}' {type_name} resource!"))
}

/// Deletes a namespaced resource, tolerating objects that are already gone.
pub async fn delete_resource<T>(
    client: &Client,
    name: &str,
    namespace: &str,
    delete_params: &DeleteParams,
) -> anyhow::Result<()>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let type_name = pretty_type_name::<T>();

    info!("Removing '{name}' {type_name} resource from the cluster...");

    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);
    match resource_api.delete(name, delete_params).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
        Err(error) => Err(error).context(format!(
            "Couldn't delete '{name}' {type_name} resource from the cluster!"
        )),
    }
}

/// Merge-patches part of a resource (finalizers, annotations, single spec
/// fields) without touching the rest.
pub async fn patch_resource_merge<T>(
    client: &Client,
    name: &str,
    namespace: &str,
    patch: &Value,
) -> anyhow::Result<T>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);

    resource_api
        .patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .context(format!(
            "Unable to patch '{name}' {} resource!",
            pretty_type_name::<T>()
        ))
}

/// Patches the status subresource through a default-bodied object so the
/// spec stays untouched.
pub async fn apply_resource_status<T, S>(
    client: &Client,
    status: S,
    name: &str,
    namespace: &str,
    patch_params: &PatchParams,
) -> anyhow::Result<()>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + HasStatus<Status = S>
        + Default
        + Serialize
        + Clone
        + DeserializeOwned
        + Debug,
{
    let type_name = pretty_type_name::<T>();
    let mut object = T::from_status(status);
    object.meta_mut().name = Some(name.to_owned());
    object.meta_mut().namespace = Some(namespace.to_owned());

    debug!("Patching '{name}' {type_name} status...");

    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);
    resource_api
        .patch_status(name, patch_params, &Patch::Apply(&object))
        .await
        .context(format!("Unable to patch '{name}' {type_name} status!"))?;

    Ok(())
}

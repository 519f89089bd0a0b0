use async_trait::async_trait;
use netris_operator_api::links;
use netris_operator_core::{
    kubernetes::operations::patch_resource_merge,
    resources::crd::v1alpha1::link::{Link, LinkMeta, LinkMetaSpec, LinkStatus},
};
use serde_json::json;

use crate::controller::{
    context::ReconcilerContext,
    error::ReconcilerError,
    sync::{ProvisionState, SyncKind, SyncOutcome},
    RequireMetadata,
};

use super::ensure_ok;

pub struct LinkSync;

#[async_trait]
impl SyncKind for LinkSync {
    type Resource = Link;
    type Meta = LinkMeta;
    type MetaSpec = LinkMetaSpec;
    type Id = String;
    type Remote = links::Link;
    type Status = LinkStatus;

    const KIND: &'static str = "Link";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Link,
    ) -> Result<LinkMetaSpec, ReconcilerError> {
        let (local_name, remote_name) = match resource.spec.ports.as_slice() {
            [local, remote] => (local, remote),
            _ => {
                return Err(ReconcilerError::TranslateError(
                    "A link takes exactly two ports".into(),
                ))
            }
        };

        let local = resolve_port(context, local_name).await?;
        let remote = resolve_port(context, remote_name).await?;

        Ok(LinkMetaSpec {
            link_name: resource.require_name()?.to_owned(),
            local,
            remote,
            ..Default::default()
        })
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &LinkMeta,
    ) -> Result<Option<links::Link>, ReconcilerError> {
        let pair = (meta.spec.local, meta.spec.remote);

        Ok(context
            .storage
            .links
            .find(|link| same_pair((link.local.id, link.remote.id), pair))
            .await)
    }

    fn remote_id(remote: &links::Link) -> String {
        LinkMetaSpec::composite_id(remote.local.id, remote.remote.id)
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &LinkMeta,
    ) -> Result<Option<links::Link>, ReconcilerError> {
        let pair = match parse_composite(&meta.spec.id) {
            Some(pair) => pair,
            None => return Ok(None),
        };

        Ok(context
            .storage
            .links
            .find_refreshed(
                |link| same_pair((link.local.id, link.remote.id), pair),
                || context.netris.list_links(),
            )
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &LinkMeta,
    ) -> Result<String, ReconcilerError> {
        let link = links::Link::between(meta.spec.local, meta.spec.remote);
        ensure_ok(context.netris.add_link(&link).await?)?;

        // links have no server-side ID; the accepted pair is the identity
        Ok(LinkMetaSpec::composite_id(meta.spec.local, meta.spec.remote))
    }

    /// A drifted link can only mean the port pair changed, and a pair IS the
    /// remote identity. Replace the old link and move the recorded ID along.
    async fn update(
        context: &ReconcilerContext,
        meta: &LinkMeta,
        current: &links::Link,
    ) -> Result<(), ReconcilerError> {
        let old = links::Link::between(current.local.id, current.remote.id);
        ensure_ok(context.netris.delete_link(&old).await?)?;

        let new = links::Link::between(meta.spec.local, meta.spec.remote);
        ensure_ok(context.netris.add_link(&new).await?)?;

        let id = LinkMetaSpec::composite_id(meta.spec.local, meta.spec.remote);
        patch_resource_merge::<LinkMeta>(
            &context.client,
            meta.require_name()?,
            meta.require_namespace()?,
            &json!({"spec": {"id": id}}),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

        Ok(())
    }

    async fn delete(context: &ReconcilerContext, meta: &LinkMeta) -> Result<(), ReconcilerError> {
        let (local, remote) =
            parse_composite(&meta.spec.id).unwrap_or((meta.spec.local, meta.spec.remote));
        let link = links::Link::between(local, remote);

        ensure_ok(context.netris.delete_link(&link).await?)
    }

    fn differs(spec: &LinkMetaSpec, remote: &links::Link) -> bool {
        !same_pair(
            (remote.local.id, remote.remote.id),
            (spec.local, spec.remote),
        )
    }

    fn provision_state(_remote: &links::Link) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, links::Link>) -> LinkStatus {
        let ports = match &outcome {
            SyncOutcome::Synced { remote, .. }
                if !remote.local.name.is_empty() && !remote.remote.name.is_empty() =>
            {
                Some(format!("{},{}", remote.local.name, remote.remote.name))
            }
            _ => None,
        };
        let base = outcome.resource_status();

        LinkStatus {
            status: base.status,
            message: base.message,
            ports,
        }
    }
}

async fn resolve_port(context: &ReconcilerContext, name: &str) -> Result<u32, ReconcilerError> {
    context
        .storage
        .find_port(name)
        .await
        .map(|port| port.id)
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Couldn't find port {name}").into())
        })
}

/// Both ends of a link are switch ports, so the controller reports the pair
/// in whichever order it likes.
fn same_pair(a: (u32, u32), b: (u32, u32)) -> bool {
    a == b || a == (b.1, b.0)
}

fn parse_composite(id: &str) -> Option<(u32, u32)> {
    let (local, remote) = id.split_once('-')?;

    Some((local.parse().ok()?, remote.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use netris_operator_api::IdName;

    use super::*;

    #[test]
    fn composite_ids_round_trip() {
        let id = LinkMetaSpec::composite_id(61, 64);

        assert_eq!(parse_composite(&id), Some((61, 64)));
        assert_eq!(parse_composite("61"), None);
        assert_eq!(parse_composite("61-swp4"), None);
    }

    #[test]
    fn reversed_pairs_are_not_drift() {
        let spec = LinkMetaSpec {
            link_name: "spine-leaf".to_owned(),
            local: 61,
            remote: 64,
            ..Default::default()
        };

        let reported = links::Link::between(64, 61);
        assert!(!LinkSync::differs(&spec, &reported));

        let moved = links::Link::between(61, 65);
        assert!(LinkSync::differs(&spec, &moved));
    }

    #[test]
    fn status_lists_both_port_names() {
        let remote = links::Link {
            local: IdName::named(61, "swp1@spine-1"),
            remote: IdName::named(64, "swp7@leaf-21"),
        };

        let status = LinkSync::status(SyncOutcome::Synced {
            state: ProvisionState::Active,
            remote: &remote,
        });
        assert_eq!(status.status.as_deref(), Some("Active"));
        assert_eq!(status.ports.as_deref(), Some("swp1@spine-1,swp7@leaf-21"));

        let nameless = links::Link::between(61, 64);
        let status = LinkSync::status(SyncOutcome::Synced {
            state: ProvisionState::Active,
            remote: &nameless,
        });
        assert_eq!(status.ports, None);
    }
}

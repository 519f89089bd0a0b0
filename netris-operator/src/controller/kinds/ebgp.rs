use async_trait::async_trait;
use netris_operator_api::bgps;
use netris_operator_core::resources::crd::v1alpha1::{
    bgp::BGPStatus,
    ebgp::{EBGP, EBGPMeta, EBGPMetaSpec},
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

use super::{
    added_id,
    bgp::{resolve_session, session_add, session_differs, session_outcome_status, session_update},
    ensure_ok,
};

/// The deprecated spelling drives the same remote collection as `BGP`; only
/// the CRD names differ.
pub struct EBGPSync;

#[async_trait]
impl SyncKind for EBGPSync {
    type Resource = EBGP;
    type Meta = EBGPMeta;
    type MetaSpec = EBGPMetaSpec;
    type Id = u32;
    type Remote = bgps::Bgp;
    type Status = BGPStatus;

    const KIND: &'static str = "EBGP";

    async fn translate(
        context: &ReconcilerContext,
        resource: &EBGP,
    ) -> Result<EBGPMetaSpec, ReconcilerError> {
        translate_ebgp(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &EBGPMeta,
    ) -> Result<Option<bgps::Bgp>, ReconcilerError> {
        Ok(context
            .storage
            .bgps
            .find(|bgp| bgp.name == meta.spec.ebgp_name)
            .await)
    }

    fn remote_id(remote: &bgps::Bgp) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &EBGPMeta,
    ) -> Result<Option<bgps::Bgp>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .bgps
            .find_refreshed(|bgp| bgp.id == id, || context.netris.list_bgps())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &EBGPMeta) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_bgp(&session_add(&meta.spec.ebgp_name, &meta.spec.session))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &EBGPMeta,
        _current: &bgps::Bgp,
    ) -> Result<(), ReconcilerError> {
        let spec = &meta.spec;

        ensure_ok(
            context
                .netris
                .update_bgp(
                    spec.id,
                    &session_update(spec.id, &spec.ebgp_name, &spec.session),
                )
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &EBGPMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_bgp(meta.spec.id).await?)
    }

    fn differs(spec: &EBGPMetaSpec, remote: &bgps::Bgp) -> bool {
        session_differs(&spec.ebgp_name, &spec.session, remote)
    }

    fn provision_state(_remote: &bgps::Bgp) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, bgps::Bgp>) -> BGPStatus {
        session_outcome_status(outcome)
    }
}

async fn translate_ebgp(
    storage: &Storage,
    resource: &EBGP,
) -> Result<EBGPMetaSpec, ReconcilerError> {
    Ok(EBGPMetaSpec {
        ebgp_name: resource.require_name()?.to_owned(),
        session: resolve_session(storage, &resource.spec.bgp).await?,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{inventory::HwItem, ports::Port, sites::Site, IdName};
    use netris_operator_core::resources::crd::v1alpha1::{
        bgp::{BGPSpec, BgpTransport},
        ebgp::EBGPSpec,
    };

    use super::*;

    async fn seeded_storage() -> Storage {
        let storage = Storage::new();
        storage
            .sites
            .replace(vec![Site {
                id: 4,
                name: "paris".to_owned(),
                ..Default::default()
            }])
            .await;
        storage
            .inventory
            .replace(vec![HwItem {
                id: 40,
                name: "sg-edge".to_owned(),
                hw_type: "softgate".to_owned(),
                site: IdName::named(4, "paris"),
                ..Default::default()
            }])
            .await;
        storage
            .ports
            .replace(vec![Port {
                id: 77,
                port: "swp3".to_owned(),
                switch_name: "spine-1".to_owned(),
                switch_id: 21,
                site_id: 4,
                ..Default::default()
            }])
            .await;

        storage
    }

    fn legacy() -> EBGP {
        EBGP::new(
            "uplink-legacy",
            EBGPSpec {
                bgp: BGPSpec {
                    site: "paris".to_owned(),
                    softgate: "sg-edge".to_owned(),
                    neighbor_as: 64512,
                    transport: BgpTransport {
                        name: "swp3@spine-1".to_owned(),
                        ..Default::default()
                    },
                    local_ip: "172.16.0.1/30".to_owned(),
                    remote_ip: "172.16.0.2/30".to_owned(),
                    ..Default::default()
                },
            },
        )
    }

    #[tokio::test]
    async fn the_alias_translates_like_its_successor() {
        let storage = seeded_storage().await;

        let spec = translate_ebgp(&storage, &legacy()).await.unwrap();

        assert_eq!(spec.ebgp_name, "uplink-legacy");
        assert_eq!(spec.id, 0);
        assert_eq!(spec.session.site_id, 4);
        assert_eq!(spec.session.nfv_id, 40);
        assert_eq!(spec.session.switch_port_id, 77);
        assert_eq!(spec.session.terminate_on_switch, "no");
        assert_eq!(spec.session.local_ip, "172.16.0.1");
    }

    #[tokio::test]
    async fn drift_checks_use_the_alias_name() {
        let storage = seeded_storage().await;
        let spec = translate_ebgp(&storage, &legacy()).await.unwrap();

        let mut remote = bgps::Bgp {
            id: 9000,
            name: "uplink-legacy".to_owned(),
            site_id: 4,
            neighbor_as: 64512,
            local_ip: "172.16.0.1".to_owned(),
            remote_ip: "172.16.0.2".to_owned(),
            status: "enabled".to_owned(),
            terminate_on_switch: "no".to_owned(),
            term_switch_id: 40,
            switch_port_id: 77,
            vlan: 1,
            originate: "disabled".to_owned(),
            ip_version: "ipv4".to_owned(),
            local_preference: 100,
            prefix_length: 30,
            ..Default::default()
        };
        assert!(!EBGPSync::differs(&spec, &remote));

        remote.name = "uplink-paris".to_owned();
        assert!(EBGPSync::differs(&spec, &remote));
    }
}

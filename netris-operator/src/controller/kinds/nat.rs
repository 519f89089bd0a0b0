use async_trait::async_trait;
use netris_operator_api::{nats, IdName};
use netris_operator_core::resources::crd::v1alpha1::{
    nat::{Nat, NatMeta, NatMetaSpec, NatState},
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

pub struct NatSync;

#[async_trait]
impl SyncKind for NatSync {
    type Resource = Nat;
    type Meta = NatMeta;
    type MetaSpec = NatMetaSpec;
    type Id = u32;
    type Remote = nats::Nat;
    type Status = ResourceStatus;

    const KIND: &'static str = "Nat";

    async fn translate(
        context: &ReconcilerContext,
        resource: &Nat,
    ) -> Result<NatMetaSpec, ReconcilerError> {
        translate_nat(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &NatMeta,
    ) -> Result<Option<nats::Nat>, ReconcilerError> {
        Ok(context
            .storage
            .nats
            .find(|nat| nat.name == meta.spec.nat_name)
            .await)
    }

    fn remote_id(remote: &nats::Nat) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &NatMeta,
    ) -> Result<Option<nats::Nat>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .nats
            .find_refreshed(|nat| nat.id == id, || context.netris.list_nats())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &NatMeta) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_nat(&nat_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &NatMeta,
        _current: &nats::Nat,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_nat(meta.spec.id, &nat_add(&meta.spec))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &NatMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_nat(meta.spec.id).await?)
    }

    fn differs(spec: &NatMetaSpec, remote: &nats::Nat) -> bool {
        // "ACCEPT" is the controller's display label for ACCEPT_SNAT
        let mut action = remote.action.label.as_str();
        if action == "ACCEPT" {
            action = "ACCEPT_SNAT";
        }

        // ports only count for the port-aware protocols
        let ports = remote.protocol.value == "tcp" || remote.protocol.value == "udp";
        let src_port_differs = ports && remote.source_port != spec.src_port;
        let dst_port_differs = ports && remote.destination_port != spec.dst_port;

        // the controller may report the destination without its prefix length
        let dst_differs = remote.destination_address != spec.dst_address
            && Some(remote.destination_address.as_str())
                != spec.dst_address.split('/').next();

        remote.name != spec.nat_name
            || remote.comment != spec.comment
            || remote.state.value != spec.state
            || remote.site.id != spec.site_id
            || action != spec.action
            || remote.protocol.value != spec.protocol
            || remote.source_address != spec.src_address
            || src_port_differs
            || dst_differs
            || dst_port_differs
            || remote.snat_to_ip != spec.snat_to_ip
            || remote.snat_to_pool != spec.snat_to_pool
            || remote.dnat_to_ip != spec.dnat_to_ip
            || remote.dnat_to_port != spec.dnat_to_port
    }

    fn provision_state(_remote: &nats::Nat) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, nats::Nat>) -> ResourceStatus {
        outcome.resource_status()
    }
}

async fn translate_nat(storage: &Storage, resource: &Nat) -> Result<NatMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let site = storage
        .sites
        .find(|site| site.name == spec.site)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Invalid site '{}'", spec.site).into())
        })?;

    Ok(NatMetaSpec {
        nat_name: resource.require_name()?.to_owned(),
        comment: spec.comment.clone().unwrap_or_default(),
        state: spec.state.unwrap_or(NatState::Enabled).as_str().to_owned(),
        site_id: site.id,
        action: spec.action.as_upper().to_owned(),
        protocol: spec.protocol.as_str().to_owned(),
        src_address: spec.src_address.clone(),
        src_port: spec.src_port.clone().unwrap_or_default(),
        dst_address: spec.dst_address.clone(),
        dst_port: spec.dst_port.clone().unwrap_or_default(),
        snat_to_ip: spec.snat_to_ip.clone().unwrap_or_default(),
        snat_to_pool: spec.snat_to_pool.clone().unwrap_or_default(),
        dnat_to_ip: spec.dnat_to_ip.clone().unwrap_or_default(),
        dnat_to_port: spec.dnat_to_port.unwrap_or_default(),
        ..Default::default()
    })
}

fn nat_add(spec: &NatMetaSpec) -> nats::NatAdd {
    nats::NatAdd {
        name: spec.nat_name.clone(),
        comment: spec.comment.clone(),
        state: spec.state.clone(),
        site: IdName::id(spec.site_id),
        action: spec.action.clone(),
        protocol: spec.protocol.clone(),
        source_address: spec.src_address.clone(),
        source_port: spec.src_port.clone(),
        destination_address: spec.dst_address.clone(),
        destination_port: spec.dst_port.clone(),
        snat_to_ip: spec.snat_to_ip.clone(),
        snat_to_pool: spec.snat_to_pool.clone(),
        dnat_to_ip: spec.dnat_to_ip.clone(),
        dnat_to_port: spec.dnat_to_port,
    }
}

#[cfg(test)]
mod tests {
    use netris_operator_api::sites::Site;
    use netris_operator_core::resources::crd::v1alpha1::nat::{NatAction, NatProtocol, NatSpec};

    use super::*;

    async fn seeded_storage() -> Storage {
        let storage = Storage::new();
        storage
            .sites
            .replace(vec![Site {
                id: 3,
                name: "yerevan".to_owned(),
                ..Default::default()
            }])
            .await;

        storage
    }

    fn translated() -> NatMetaSpec {
        NatMetaSpec {
            nat_name: "egress".to_owned(),
            state: "enabled".to_owned(),
            site_id: 3,
            action: "ACCEPT_SNAT".to_owned(),
            protocol: "tcp".to_owned(),
            src_address: "10.0.0.0/24".to_owned(),
            src_port: "1-65535".to_owned(),
            dst_address: "203.0.113.7/32".to_owned(),
            dst_port: "443".to_owned(),
            ..Default::default()
        }
    }

    fn remote() -> nats::Nat {
        nats::Nat {
            id: 9,
            name: "egress".to_owned(),
            state: nats::LabelValue {
                label: "Enabled".to_owned(),
                value: "enabled".to_owned(),
            },
            site: IdName::id(3),
            action: nats::LabelValue {
                label: "ACCEPT".to_owned(),
                value: "accept_snat".to_owned(),
            },
            protocol: nats::LabelValue {
                label: "TCP".to_owned(),
                value: "tcp".to_owned(),
            },
            source_address: "10.0.0.0/24".to_owned(),
            source_port: "1-65535".to_owned(),
            destination_address: "203.0.113.7".to_owned(),
            destination_port: "443".to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn translation_upper_cases_the_action() {
        let storage = seeded_storage().await;
        let nat = Nat::new(
            "egress",
            NatSpec {
                site: "yerevan".to_owned(),
                action: NatAction::AcceptSnat,
                protocol: NatProtocol::Tcp,
                src_address: "10.0.0.0/24".to_owned(),
                dst_address: "203.0.113.7/32".to_owned(),
                ..Default::default()
            },
        );

        let spec = translate_nat(&storage, &nat).await.unwrap();

        assert_eq!(spec.action, "ACCEPT_SNAT");
        assert_eq!(spec.state, "enabled");
        assert_eq!(spec.site_id, 3);
    }

    #[tokio::test]
    async fn unknown_sites_fail_translation() {
        let storage = seeded_storage().await;
        let nat = Nat::new(
            "egress",
            NatSpec {
                site: "gyumri".to_owned(),
                ..Default::default()
            },
        );

        let error = translate_nat(&storage, &nat).await.unwrap_err();
        assert_eq!(error.to_string(), "Invalid site 'gyumri'");
    }

    #[test]
    fn accept_label_and_stripped_prefix_are_not_drift() {
        assert!(!NatSync::differs(&translated(), &remote()));
    }

    #[test]
    fn ports_only_count_for_port_aware_protocols() {
        let mut spec = translated();
        let mut reported = remote();
        reported.destination_port = "8443".to_owned();
        assert!(NatSync::differs(&spec, &reported));

        spec.protocol = "icmp".to_owned();
        reported.protocol.value = "icmp".to_owned();
        assert!(!NatSync::differs(&spec, &reported));
    }
}

use async_trait::async_trait;
use ipnet::IpNet;
use netris_operator_api::bgps::{self, BgpAdd};
use netris_operator_core::resources::crd::v1alpha1::bgp::{
    BGP, BGPMeta, BGPMetaSpec, BGPSpec, BGPStatus, BgpSession, TransportType,
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

use super::{added_id, ensure_ok, modified_timestamp};

pub struct BGPSync;

#[async_trait]
impl SyncKind for BGPSync {
    type Resource = BGP;
    type Meta = BGPMeta;
    type MetaSpec = BGPMetaSpec;
    type Id = u32;
    type Remote = bgps::Bgp;
    type Status = BGPStatus;

    const KIND: &'static str = "BGP";

    async fn translate(
        context: &ReconcilerContext,
        resource: &BGP,
    ) -> Result<BGPMetaSpec, ReconcilerError> {
        translate_bgp(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &BGPMeta,
    ) -> Result<Option<bgps::Bgp>, ReconcilerError> {
        Ok(context
            .storage
            .bgps
            .find(|bgp| bgp.name == meta.spec.bgp_name)
            .await)
    }

    fn remote_id(remote: &bgps::Bgp) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &BGPMeta,
    ) -> Result<Option<bgps::Bgp>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .bgps
            .find_refreshed(|bgp| bgp.id == id, || context.netris.list_bgps())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &BGPMeta) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_bgp(&session_add(&meta.spec.bgp_name, &meta.spec.session))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &BGPMeta,
        _current: &bgps::Bgp,
    ) -> Result<(), ReconcilerError> {
        let spec = &meta.spec;

        ensure_ok(
            context
                .netris
                .update_bgp(spec.id, &session_update(spec.id, &spec.bgp_name, &spec.session))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &BGPMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_bgp(meta.spec.id).await?)
    }

    fn differs(spec: &BGPMetaSpec, remote: &bgps::Bgp) -> bool {
        session_differs(&spec.bgp_name, &spec.session, remote)
    }

    fn provision_state(_remote: &bgps::Bgp) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, bgps::Bgp>) -> BGPStatus {
        session_outcome_status(outcome)
    }
}

async fn translate_bgp(storage: &Storage, resource: &BGP) -> Result<BGPMetaSpec, ReconcilerError> {
    Ok(BGPMetaSpec {
        bgp_name: resource.require_name()?.to_owned(),
        session: resolve_session(storage, &resource.spec).await?,
        ..Default::default()
    })
}

/// Resolves every name in the session spec against the caches. Shared with
/// the deprecated `EBGP` spelling, which carries the same spec.
pub(super) async fn resolve_session(
    storage: &Storage,
    spec: &BGPSpec,
) -> Result<BgpSession, ReconcilerError> {
    let site = storage
        .sites
        .find(|site| site.name == spec.site)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("invalid site '{}'", spec.site).into())
        })?;

    let mut nfv_id = 0;
    let mut nfv_port_id = 0;
    let mut term_switch_id = 0;
    let terminate_on_switch = if spec.terminate_on_switch.enabled {
        "yes"
    } else {
        "no"
    };

    if !spec.terminate_on_switch.enabled {
        let softgate = storage
            .inventory
            .find(|item| {
                item.hw_type == "softgate" && item.site.id == site.id && item.name == spec.softgate
            })
            .await
            .ok_or_else(|| {
                ReconcilerError::TranslateError(
                    format!("invalid softgate '{}'", spec.softgate).into(),
                )
            })?;

        nfv_id = softgate.id;
        term_switch_id = softgate.id;
        nfv_port_id = softgate
            .links
            .first()
            .map(|link| link.local.id)
            .unwrap_or_default();
    }

    let mut vlan = spec.transport.vlan_id.filter(|vlan| *vlan > 1).unwrap_or(1);
    let mut switch_port_id = 0;
    let mut rcircuit_id = 0;

    match spec.transport.type_ {
        TransportType::Port => {
            let port = storage
                .ports
                .find(|port| {
                    port.site_id == site.id && port.qualified_name() == spec.transport.name
                })
                .await
                .ok_or_else(|| {
                    ReconcilerError::TranslateError(
                        format!("invalid port '{}'", spec.transport.name).into(),
                    )
                })?;

            switch_port_id = port.id;
            if spec.terminate_on_switch.enabled {
                term_switch_id = port.switch_id;
            }
        }
        TransportType::Vnet => {
            // vnet transports ride the network untagged
            vlan = 1;
            let vnet = storage
                .vnets
                .find(|vnet| vnet.name == spec.transport.name)
                .await
                .ok_or_else(|| {
                    ReconcilerError::TranslateError(
                        format!("invalid vnet '{}'", spec.transport.name).into(),
                    )
                })?;

            rcircuit_id = vnet.id;
            if spec.terminate_on_switch.enabled {
                let switch = storage
                    .inventory
                    .find(|item| {
                        item.hw_type == "switch"
                            && item.site.id == site.id
                            && item.name == spec.terminate_on_switch.switch_name
                    })
                    .await
                    .ok_or_else(|| {
                        ReconcilerError::TranslateError(
                            format!(
                                "invalid TerminateOnSwitchName '{}'",
                                spec.terminate_on_switch.switch_name
                            )
                            .into(),
                        )
                    })?;

                term_switch_id = switch.id;
            }
        }
    }

    let local = spec.local_ip.parse::<IpNet>().map_err(|_| {
        ReconcilerError::TranslateError(format!("invalid localIP '{}'", spec.local_ip).into())
    })?;
    let remote = spec.remote_ip.parse::<IpNet>().map_err(|_| {
        ReconcilerError::TranslateError(format!("invalid remoteIP '{}'", spec.remote_ip).into())
    })?;

    Ok(BgpSession {
        site_id: site.id,
        nfv_id,
        nfv_port_id,
        switch_port_id,
        vlan,
        rcircuit_id,
        term_switch_id,
        terminate_on_switch: terminate_on_switch.to_owned(),
        neighbor_as: spec.neighbor_as,
        local_ip: local.addr().to_string(),
        remote_ip: remote.addr().to_string(),
        ip_version: match local {
            IpNet::V4(_) => "ipv4".to_owned(),
            IpNet::V6(_) => "ipv6".to_owned(),
        },
        prefix_length: local.prefix_len(),
        description: spec.description.clone(),
        status: spec.state.as_str().to_owned(),
        neighbor_address: (!spec.multihop.neighbor_address.is_empty())
            .then(|| spec.multihop.neighbor_address.clone()),
        update_source: spec.multihop.update_source.clone(),
        multihop: spec.multihop.hops,
        bgp_password: spec.bgp_password.clone(),
        allowas_in: spec.allow_as_in,
        originate: if spec.default_originate {
            "enabled"
        } else {
            "disabled"
        }
        .to_owned(),
        prefix_limit: spec.prefix_inbound_max,
        local_preference: if spec.local_preference > 0 {
            spec.local_preference
        } else {
            100
        },
        weight: spec.weight,
        prepend_inbound: spec.prepend_inbound,
        prepend_outbound: spec.prepend_outbound,
        prefix_list_inbound: spec.prefix_list_inbound.join("\n"),
        prefix_list_outbound: spec.prefix_list_outbound.join("\n"),
        community: spec.send_bgp_community.join("\n"),
        ..Default::default()
    })
}

/// The prefix limit is write-only on the controller side and the softgate
/// pair (`nfvID`/`nfvPortID`) only shows through `termSwitchID`, so neither
/// is compared directly. Route-map references come back stringified.
pub(super) fn session_differs(name: &str, session: &BgpSession, remote: &bgps::Bgp) -> bool {
    let route_maps_differ = remote.inbound_route_map.parse::<u32>().unwrap_or_default()
        != session.inbound_route_map
        || remote.outbound_route_map.parse::<u32>().unwrap_or_default()
            != session.outbound_route_map;
    // only vnet-backed sessions keep a stable circuit reference
    let circuit_differs = session.rcircuit_id > 0 && remote.rcircuit_id != session.rcircuit_id;
    let termination_differs = remote.terminate_on_switch != session.terminate_on_switch
        || remote.term_switch_id != session.term_switch_id
        || (session.terminate_on_switch != "yes" && remote.term_switch_id != session.nfv_id);

    remote.name != name
        || remote.site_id != session.site_id
        || remote.neighbor_as != session.neighbor_as
        || remote.local_ip != session.local_ip
        || remote.remote_ip != session.remote_ip
        || remote.description != session.description
        || remote.status != session.status
        || remote.switch_port_id != session.switch_port_id
        || remote.vlan != u32::from(session.vlan)
        || remote.neighbor_address != session.neighbor_address.as_deref().unwrap_or_default()
        || remote.update_source != session.update_source
        || remote.multihop != u32::from(session.multihop)
        || remote.bgp_password != session.bgp_password
        || remote.allowas_in != session.allowas_in
        || remote.originate != session.originate
        || remote.ip_version != session.ip_version
        || remote.prefix_length != u32::from(session.prefix_length)
        || remote.local_preference != session.local_preference
        || remote.weight != session.weight
        || remote.prepend_inbound != session.prepend_inbound
        || remote.prepend_outbound != session.prepend_outbound
        || remote.prefix_list_inbound != session.prefix_list_inbound
        || remote.prefix_list_outbound != session.prefix_list_outbound
        || remote.community != session.community
        || route_maps_differ
        || circuit_differs
        || termination_differs
}

pub(super) fn session_add(name: &str, session: &BgpSession) -> BgpAdd {
    BgpAdd {
        name: name.to_owned(),
        site_id: session.site_id,
        neighbor_as: session.neighbor_as,
        local_ip: session.local_ip.clone(),
        remote_ip: session.remote_ip.clone(),
        description: session.description.clone(),
        status: session.status.clone(),
        terminate_on_switch: session.terminate_on_switch.clone(),
        term_switch_id: session.term_switch_id,
        nfv_id: session.nfv_id,
        nfv_port_id: session.nfv_port_id,
        switch_port_id: session.switch_port_id,
        vlan: session.vlan.into(),
        rcircuit_id: session.rcircuit_id,
        neighbor_address: session.neighbor_address.clone(),
        update_source: session.update_source.clone(),
        multihop: session.multihop.into(),
        bgp_password: session.bgp_password.clone(),
        allowas_in: session.allowas_in,
        originate: session.originate.clone(),
        prefix_limit: session.prefix_limit,
        ip_version: session.ip_version.clone(),
        inbound_route_map: session.inbound_route_map,
        outbound_route_map: session.outbound_route_map,
        local_preference: session.local_preference,
        weight: session.weight,
        prepend_inbound: session.prepend_inbound,
        prepend_outbound: session.prepend_outbound,
        prefix_length: session.prefix_length.into(),
        prefix_list_inbound: session.prefix_list_inbound.clone(),
        prefix_list_outbound: session.prefix_list_outbound.clone(),
        community: session.community.clone(),
        ..Default::default()
    }
}

pub(super) fn session_update(id: u32, name: &str, session: &BgpSession) -> BgpAdd {
    BgpAdd {
        id: Some(id),
        ..session_add(name, session)
    }
}

pub(super) fn session_outcome_status(outcome: SyncOutcome<'_, bgps::Bgp>) -> BGPStatus {
    let session = match &outcome {
        SyncOutcome::Synced { remote, .. } => Some(session_status(remote)),
        _ => None,
    };
    let base = outcome.resource_status();

    let mut status = session.unwrap_or_default();
    status.status = base.status;
    status.message = base.message;
    status
}

/// The per-session health columns, shaped the way `kubectl get bgp -o wide`
/// shows them.
fn session_status(remote: &bgps::Bgp) -> BGPStatus {
    // a vnet-backed session has no port of its own
    let port_state = if remote.rcircuit_id > 0 {
        "N/A".to_owned()
    } else {
        remote.port_status.clone()
    };
    let vlan_id = if remote.vlan > 1 {
        remote.vlan.to_string()
    } else {
        "untagged".to_owned()
    };

    BGPStatus {
        modified: modified_timestamp(remote.modified_date),
        bgp_state: Some(format!(
            "bgp: {}; prefix: {}; time: {}",
            remote.bgp_state, remote.bgp_prefixes, remote.bgp_uptime
        )),
        bgp_status: Some(remote.bgp_state.clone()),
        bgp_prefixes: Some(remote.bgp_prefixes.parse().unwrap_or_default()),
        port_state: Some(port_state),
        terminate_on_switch: Some(remote.term_switch_name.clone()),
        vlan_id: Some(vlan_id),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{
        inventory::{HwItem, HwLink},
        ports::Port,
        sites::Site,
        vnets::VNet,
        IdName,
    };
    use netris_operator_core::resources::crd::v1alpha1::bgp::{BgpTransport, TerminateOnSwitch};

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
            .replace(vec![
                HwItem {
                    id: 40,
                    name: "sg-edge".to_owned(),
                    hw_type: "softgate".to_owned(),
                    site: IdName::named(4, "paris"),
                    links: vec![HwLink {
                        local: IdName::id(400),
                        remote: IdName::id(800),
                    }],
                    ..Default::default()
                },
                HwItem {
                    id: 21,
                    name: "spine-1".to_owned(),
                    hw_type: "switch".to_owned(),
                    site: IdName::named(4, "paris"),
                    ..Default::default()
                },
            ])
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
            .vnets
            .replace(vec![VNet {
                id: 9,
                name: "transit".to_owned(),
                ..Default::default()
            }])
            .await;

        storage
    }

    fn upstream() -> BGP {
        BGP::new(
            "uplink-paris",
            BGPSpec {
                site: "paris".to_owned(),
                softgate: "sg-edge".to_owned(),
                neighbor_as: 64512,
                transport: BgpTransport {
                    type_: TransportType::Port,
                    name: "swp3@spine-1".to_owned(),
                    vlan_id: None,
                },
                local_ip: "172.16.0.1/30".to_owned(),
                remote_ip: "172.16.0.2/30".to_owned(),
                description: "uplink".to_owned(),
                prefix_list_inbound: vec!["permit 10.0.0.0/8 le 24".to_owned()],
                prefix_list_outbound: vec!["permit 198.51.100.0/24".to_owned()],
                send_bgp_community: vec!["65535:65281".to_owned()],
                ..Default::default()
            },
        )
    }

    fn reported() -> bgps::Bgp {
        bgps::Bgp {
            id: 9000,
            name: "uplink-paris".to_owned(),
            site_id: 4,
            neighbor_as: 64512,
            local_ip: "172.16.0.1".to_owned(),
            remote_ip: "172.16.0.2".to_owned(),
            description: "uplink".to_owned(),
            status: "enabled".to_owned(),
            terminate_on_switch: "no".to_owned(),
            term_switch_id: 40,
            term_switch_name: "sg-edge".to_owned(),
            switch_port_id: 77,
            vlan: 1,
            originate: "disabled".to_owned(),
            ip_version: "ipv4".to_owned(),
            inbound_route_map: "0".to_owned(),
            outbound_route_map: "0".to_owned(),
            local_preference: 100,
            prefix_length: 30,
            prefix_list_inbound: "permit 10.0.0.0/8 le 24".to_owned(),
            prefix_list_outbound: "permit 198.51.100.0/24".to_owned(),
            community: "65535:65281".to_owned(),
            bgp_state: "Established".to_owned(),
            bgp_prefixes: "214".to_owned(),
            bgp_uptime: "13:17:04".to_owned(),
            port_status: "up".to_owned(),
            modified_date: 1_620_000_000_500,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn translation_resolves_the_port_transport() {
        let storage = seeded_storage().await;

        let spec = translate_bgp(&storage, &upstream()).await.unwrap();
        assert_eq!(spec.bgp_name, "uplink-paris");

        let session = &spec.session;
        assert_eq!(session.site_id, 4);
        assert_eq!(session.nfv_id, 40);
        assert_eq!(session.nfv_port_id, 400);
        assert_eq!(session.term_switch_id, 40);
        assert_eq!(session.terminate_on_switch, "no");
        assert_eq!(session.switch_port_id, 77);
        assert_eq!(session.rcircuit_id, 0);
        assert_eq!(session.vlan, 1);

        assert_eq!(session.local_ip, "172.16.0.1");
        assert_eq!(session.remote_ip, "172.16.0.2");
        assert_eq!(session.prefix_length, 30);
        assert_eq!(session.ip_version, "ipv4");

        assert_eq!(session.status, "enabled");
        assert_eq!(session.originate, "disabled");
        assert_eq!(session.local_preference, 100);
        assert_eq!(session.neighbor_address, None);
        assert_eq!(session.prefix_list_inbound, "permit 10.0.0.0/8 le 24");
        assert_eq!(session.community, "65535:65281");

        let mut tagged = upstream();
        tagged.spec.transport.vlan_id = Some(50);
        let spec = translate_bgp(&storage, &tagged).await.unwrap();
        assert_eq!(spec.session.vlan, 50);
    }

    #[tokio::test]
    async fn vnet_transport_terminates_on_the_named_switch() {
        let storage = seeded_storage().await;
        let mut bgp = upstream();
        bgp.spec.softgate = String::new();
        bgp.spec.transport = BgpTransport {
            type_: TransportType::Vnet,
            name: "transit".to_owned(),
            vlan_id: Some(70),
        };
        bgp.spec.terminate_on_switch = TerminateOnSwitch {
            enabled: true,
            switch_name: "spine-1".to_owned(),
        };

        let session = resolve_session(&storage, &bgp.spec).await.unwrap();

        assert_eq!(session.rcircuit_id, 9);
        assert_eq!(session.vlan, 1);
        assert_eq!(session.term_switch_id, 21);
        assert_eq!(session.terminate_on_switch, "yes");
        assert_eq!(session.nfv_id, 0);
        assert_eq!(session.switch_port_id, 0);
    }

    #[tokio::test]
    async fn unknown_references_fail_translation() {
        let storage = seeded_storage().await;

        let mut bgp = upstream();
        bgp.spec.site = "ghost".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid site 'ghost'");

        let mut bgp = upstream();
        bgp.spec.softgate = "ghost".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid softgate 'ghost'");

        let mut bgp = upstream();
        bgp.spec.transport.name = "swp9@spine-1".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid port 'swp9@spine-1'");

        let mut bgp = upstream();
        bgp.spec.terminate_on_switch.enabled = true;
        bgp.spec.transport.type_ = TransportType::Vnet;
        bgp.spec.transport.name = "ghost".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid vnet 'ghost'");

        let mut bgp = upstream();
        bgp.spec.terminate_on_switch = TerminateOnSwitch {
            enabled: true,
            switch_name: "ghost".to_owned(),
        };
        bgp.spec.transport.type_ = TransportType::Vnet;
        bgp.spec.transport.name = "transit".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid TerminateOnSwitchName 'ghost'");

        let mut bgp = upstream();
        bgp.spec.local_ip = "172.16.0.500/30".to_owned();
        let error = resolve_session(&storage, &bgp.spec).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid localIP '172.16.0.500/30'");
    }

    #[tokio::test]
    async fn stringified_route_maps_are_not_drift() {
        let storage = seeded_storage().await;
        let session = resolve_session(&storage, &upstream().spec).await.unwrap();

        assert!(!session_differs("uplink-paris", &session, &reported()));

        // controllers that never had a route map report an empty string
        let mut unset = reported();
        unset.inbound_route_map = String::new();
        assert!(!session_differs("uplink-paris", &session, &unset));

        let mut mapped = reported();
        mapped.outbound_route_map = "7".to_owned();
        assert!(session_differs("uplink-paris", &session, &mapped));
    }

    #[tokio::test]
    async fn outbound_prepends_count_on_their_own() {
        let storage = seeded_storage().await;
        let session = resolve_session(&storage, &upstream().spec).await.unwrap();

        let mut prepended = reported();
        prepended.prepend_outbound = 3;
        assert!(session_differs("uplink-paris", &session, &prepended));
    }

    #[tokio::test]
    async fn a_moved_softgate_is_termination_drift() {
        let storage = seeded_storage().await;
        let session = resolve_session(&storage, &upstream().spec).await.unwrap();

        let mut moved = reported();
        moved.term_switch_id = 41;
        assert!(session_differs("uplink-paris", &session, &moved));
    }

    #[tokio::test]
    async fn update_carries_the_remote_id() {
        let storage = seeded_storage().await;
        let session = resolve_session(&storage, &upstream().spec).await.unwrap();

        let add = session_add("uplink-paris", &session);
        assert_eq!(add.id, None);
        assert_eq!(add.neighbor_as, 64512);
        assert_eq!(add.vlan, 1);
        assert_eq!(add.neighbor_address, None);

        let update = session_update(9000, "uplink-paris", &session);
        assert_eq!(update.id, Some(9000));
    }

    #[test]
    fn session_health_lands_in_the_status() {
        let status = session_status(&reported());

        assert_eq!(
            status.bgp_state.as_deref(),
            Some("bgp: Established; prefix: 214; time: 13:17:04")
        );
        assert_eq!(status.bgp_status.as_deref(), Some("Established"));
        assert_eq!(status.bgp_prefixes, Some(214));
        assert_eq!(status.port_state.as_deref(), Some("up"));
        assert_eq!(status.terminate_on_switch.as_deref(), Some("sg-edge"));
        assert_eq!(status.vlan_id.as_deref(), Some("untagged"));
        assert_eq!(status.modified.unwrap().timestamp(), 1_620_000_000);

        let mut vnet_backed = reported();
        vnet_backed.rcircuit_id = 9;
        vnet_backed.vlan = 50;
        let status = session_status(&vnet_backed);
        assert_eq!(status.port_state.as_deref(), Some("N/A"));
        assert_eq!(status.vlan_id.as_deref(), Some("50"));

        let failed = BGPSync::status(SyncOutcome::Failed {
            message: "invalid site 'ghost'".to_owned(),
        });
        assert_eq!(failed.status.as_deref(), Some("Failure"));
        assert!(failed.bgp_state.is_none());
    }
}

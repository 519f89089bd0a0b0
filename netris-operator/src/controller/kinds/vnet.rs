use std::collections::HashSet;

use async_trait::async_trait;
use ipnet::IpNet;
use itertools::Itertools;
use netris_operator_api::vnets::{self, NameRef, VNetAdd, VNetAddGateway, VNetAddPort, VNetUpdate};
use netris_operator_core::resources::crd::v1alpha1::vnet::{
    VNet, VNetMeta, VNetMetaGateway, VNetMetaMember, VNetMetaSite, VNetMetaSpec, VNetSite,
    VNetState, VNetStatus,
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

pub struct VNetSync;

#[async_trait]
impl SyncKind for VNetSync {
    type Resource = VNet;
    type Meta = VNetMeta;
    type MetaSpec = VNetMetaSpec;
    type Id = u32;
    type Remote = vnets::VNet;
    type Status = VNetStatus;

    const KIND: &'static str = "VNet";

    async fn translate(
        context: &ReconcilerContext,
        resource: &VNet,
    ) -> Result<VNetMetaSpec, ReconcilerError> {
        translate_vnet(&context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &VNetMeta,
    ) -> Result<Option<vnets::VNet>, ReconcilerError> {
        Ok(context
            .storage
            .vnets
            .find(|vnet| vnet.name == meta.spec.vnet_name)
            .await)
    }

    fn remote_id(remote: &vnets::VNet) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &VNetMeta,
    ) -> Result<Option<vnets::VNet>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .vnets
            .find_refreshed(|vnet| vnet.id == id, || context.netris.list_vnets())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &VNetMeta) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_vnet(&vnet_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &VNetMeta,
        _current: &vnets::VNet,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_vnet(meta.spec.id, &vnet_update(&meta.spec))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &VNetMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_vnet(meta.spec.id).await?)
    }

    /// The controller reorders every list it returns, so membership is what
    /// counts, not position. Ports compare on the resolved trio; the rest of
    /// the member record is padding the controller fills on its own.
    fn differs(spec: &VNetMetaSpec, remote: &vnets::VNet) -> bool {
        let sites_differ = !spec
            .sites
            .iter()
            .map(|site| &site.name)
            .sorted()
            .eq(remote.sites.iter().map(|site| &site.name).sorted());
        let tenants_differ = !spec
            .tenants
            .iter()
            .sorted()
            .eq(remote.guest_tenants.iter().map(|tenant| &tenant.name).sorted());
        let gateways_differ = !spec
            .gateways
            .iter()
            .map(VNetMetaGateway::prefix)
            .sorted()
            .eq(remote.gateways.iter().map(|gateway| gateway.prefix.clone()).sorted());
        let members_differ = !spec
            .members
            .iter()
            .map(|member| (member.port_id, member.tenant_id, member.vlan_id))
            .sorted()
            .eq(remote
                .ports
                .iter()
                .map(|port| (port.id, port.tenant.id, port.vlan.parse::<u16>().unwrap_or_default()))
                .sorted());

        remote.name != spec.vnet_name
            || remote.tenant.name != spec.owner
            || remote.state != spec.state.as_str()
            || sites_differ
            || tenants_differ
            || gateways_differ
            || members_differ
    }

    fn provision_state(_remote: &vnets::VNet) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, vnets::VNet>) -> VNetStatus {
        let state = match &outcome {
            SyncOutcome::Synced { remote, .. } => Some(remote.state.clone()),
            _ => None,
        };
        let base = outcome.resource_status();

        VNetStatus {
            status: base.status,
            message: base.message,
            state,
        }
    }
}

async fn translate_vnet(storage: &Storage, resource: &VNet) -> Result<VNetMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    storage
        .tenants
        .find(|tenant| tenant.name == spec.owner_tenant)
        .await
        .ok_or_else(|| {
            ReconcilerError::TranslateError(format!("invalid tenant '{}'", spec.owner_tenant).into())
        })?;

    for tenant_name in &spec.guest_tenants {
        storage
            .tenants
            .find(|tenant| tenant.name == *tenant_name)
            .await
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("invalid tenant '{tenant_name}'").into())
            })?;
    }

    fn site_name(site: &VNetSite) -> &String {
        &site.name
    }

    let mut sites = Vec::new();
    for name in spec.sites.iter().map(site_name).unique() {
        let site = storage
            .sites
            .find(|site| site.name == *name)
            .await
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("invalid site '{name}'").into())
            })?;

        sites.push(VNetMetaSite {
            id: site.id,
            name: site.name,
        });
    }

    let mut gateways = Vec::new();
    let mut seen = HashSet::new();
    for gateway in spec.sites.iter().flat_map(|site| site.gateways.iter()) {
        if !seen.insert(gateway) {
            return Err(ReconcilerError::TranslateError(
                format!("duplicated gateway '{gateway}'").into(),
            ));
        }

        let prefix = gateway.parse::<IpNet>().map_err(|_| {
            ReconcilerError::TranslateError(format!("invalid gateway '{gateway}'").into())
        })?;

        gateways.push(VNetMetaGateway {
            gateway: prefix.addr().to_string(),
            gw_length: prefix.prefix_len(),
            version: match prefix {
                IpNet::V4(_) => "ipv4".to_owned(),
                IpNet::V6(_) => "ipv6".to_owned(),
            },
        });
    }

    // a port may appear under several sites; it joins the network once
    let mut members = Vec::new();
    for port in spec
        .sites
        .iter()
        .flat_map(|site| site.switch_ports.iter())
        .unique_by(|port| &port.name)
    {
        let resolved = storage.find_port(&port.name).await.ok_or_else(|| {
            ReconcilerError::TranslateError(format!("port '{}' not found", port.name).into())
        })?;

        let vlan_id = port.vlan_id.unwrap_or(1);

        members.push(VNetMetaMember {
            lacp: "off".to_owned(),
            member_state: port.state.unwrap_or_default().as_str().to_owned(),
            parent_port: resolved.parent_port,
            port_is_untagged: vlan_id == 1,
            port_id: resolved.id,
            port_name: port.name.clone(),
            tenant_id: resolved.tenant_id,
            vlan_id,
        });
    }

    Ok(VNetMetaSpec {
        vnet_name: resource.require_name()?.to_owned(),
        owner: spec.owner_tenant.clone(),
        state: spec.state.unwrap_or_default(),
        gateways,
        members,
        sites,
        tenants: spec.guest_tenants.clone(),
        ..Default::default()
    })
}

fn vnet_add(spec: &VNetMetaSpec) -> VNetAdd {
    VNetAdd {
        name: spec.vnet_name.clone(),
        tenant: NameRef::new(spec.owner.as_str()),
        guest_tenants: named_refs(&spec.tenants),
        state: spec.state.as_str().to_owned(),
        sites: spec
            .sites
            .iter()
            .map(|site| NameRef::new(site.name.as_str()))
            .collect(),
        gateways: payload_gateways(spec),
        ports: payload_ports(spec),
        native_vlan: 1,
    }
}

fn vnet_update(spec: &VNetMetaSpec) -> VNetUpdate {
    VNetUpdate {
        name: spec.vnet_name.clone(),
        guest_tenants: named_refs(&spec.tenants),
        state: spec.state.as_str().to_owned(),
        sites: spec
            .sites
            .iter()
            .map(|site| NameRef::new(site.name.as_str()))
            .collect(),
        gateways: payload_gateways(spec),
        ports: payload_ports(spec),
        native_vlan: 1,
    }
}

fn named_refs(names: &[String]) -> Vec<NameRef> {
    names.iter().map(|name| NameRef::new(name.as_str())).collect()
}

fn payload_gateways(spec: &VNetMetaSpec) -> Vec<VNetAddGateway> {
    spec.gateways
        .iter()
        .map(|gateway| VNetAddGateway {
            prefix: gateway.prefix(),
        })
        .collect()
}

fn payload_ports(spec: &VNetMetaSpec) -> Vec<VNetAddPort> {
    spec.members
        .iter()
        .map(|member| VNetAddPort {
            id: member.port_id,
            name: member.port_name.clone(),
            vlan: member.vlan_id.to_string(),
            lacp: member.lacp.clone(),
            state: member.member_state.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{ports::Port, sites::Site, tenants::Tenant, IdName};
    use netris_operator_core::resources::crd::v1alpha1::vnet::{VNetSite, VNetSpec, VNetSwitchPort};

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
            .tenants
            .replace(vec![
                Tenant {
                    id: 2,
                    name: "ops".to_owned(),
                    ..Default::default()
                },
                Tenant {
                    id: 5,
                    name: "dev".to_owned(),
                    ..Default::default()
                },
            ])
            .await;
        storage
            .ports
            .replace(vec![
                Port {
                    id: 11,
                    port: "swp7".to_owned(),
                    switch_name: "leaf-21".to_owned(),
                    tenant_id: 2,
                    ..Default::default()
                },
                Port {
                    id: 12,
                    port: "swp8".to_owned(),
                    switch_name: "leaf-21".to_owned(),
                    tenant_id: 2,
                    ..Default::default()
                },
            ])
            .await;

        storage
    }

    fn campus() -> VNet {
        VNet::new(
            "campus",
            VNetSpec {
                owner_tenant: "ops".to_owned(),
                state: None,
                guest_tenants: vec!["dev".to_owned()],
                sites: vec![VNetSite {
                    name: "yerevan".to_owned(),
                    gateways: vec!["10.0.0.1/24".to_owned(), "2001:db8::1/64".to_owned()],
                    switch_ports: vec![
                        VNetSwitchPort {
                            name: "swp7@leaf-21".to_owned(),
                            vlan_id: None,
                            state: None,
                        },
                        VNetSwitchPort {
                            name: "swp8@leaf-21".to_owned(),
                            vlan_id: Some(50),
                            state: Some(VNetState::Disabled),
                        },
                    ],
                }],
            },
        )
    }

    fn reported() -> vnets::VNet {
        vnets::VNet {
            id: 77,
            name: "campus".to_owned(),
            tenant: IdName::named(2, "ops"),
            guest_tenants: vec![IdName::named(5, "dev")],
            state: "active".to_owned(),
            sites: vec![IdName::named(3, "yerevan")],
            gateways: vec![
                vnets::VNetGateway {
                    prefix: "10.0.0.1/24".to_owned(),
                },
                vnets::VNetGateway {
                    prefix: "2001:db8::1/64".to_owned(),
                },
            ],
            ports: vec![
                vnets::VNetPort {
                    id: 11,
                    tenant: IdName::id(2),
                    vlan: "1".to_owned(),
                    ..Default::default()
                },
                vnets::VNetPort {
                    id: 12,
                    tenant: IdName::id(2),
                    vlan: "50".to_owned(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn translation_resolves_ports_and_parses_gateways() {
        let storage = seeded_storage().await;

        let spec = translate_vnet(&storage, &campus()).await.unwrap();

        assert_eq!(spec.vnet_name, "campus");
        assert_eq!(spec.owner, "ops");
        assert_eq!(spec.state, VNetState::Active);
        assert_eq!(spec.sites.len(), 1);
        assert_eq!(spec.sites[0].id, 3);
        assert_eq!(spec.tenants, vec!["dev"]);

        assert_eq!(
            spec.gateways[0],
            VNetMetaGateway {
                gateway: "10.0.0.1".to_owned(),
                gw_length: 24,
                version: "ipv4".to_owned(),
            }
        );
        assert_eq!(spec.gateways[1].version, "ipv6");

        let untagged = &spec.members[0];
        assert_eq!(untagged.port_id, 11);
        assert_eq!(untagged.vlan_id, 1);
        assert!(untagged.port_is_untagged);
        assert_eq!(untagged.member_state, "active");
        assert_eq!(untagged.lacp, "off");

        let tagged = &spec.members[1];
        assert_eq!(tagged.vlan_id, 50);
        assert!(!tagged.port_is_untagged);
        assert_eq!(tagged.member_state, "disabled");
    }

    #[tokio::test]
    async fn repeated_ports_and_sites_collapse() {
        let storage = seeded_storage().await;
        let mut vnet = campus();
        let mut second = vnet.spec.sites[0].clone();
        second.gateways.clear();
        vnet.spec.sites.push(second);

        let spec = translate_vnet(&storage, &vnet).await.unwrap();

        assert_eq!(spec.sites.len(), 1);
        assert_eq!(spec.members.len(), 2);
    }

    #[tokio::test]
    async fn unknown_ports_fail_translation() {
        let storage = seeded_storage().await;
        let mut vnet = campus();
        vnet.spec.sites[0].switch_ports[0].name = "swp9@leaf-3".to_owned();

        let error = translate_vnet(&storage, &vnet).await.unwrap_err();
        assert_eq!(error.to_string(), "port 'swp9@leaf-3' not found");
    }

    #[tokio::test]
    async fn gateway_validation_catches_repeats_and_garbage() {
        let storage = seeded_storage().await;

        let mut vnet = campus();
        vnet.spec.sites[0].gateways = vec!["10.0.0.1/24".to_owned(), "10.0.0.1/24".to_owned()];
        let error = translate_vnet(&storage, &vnet).await.unwrap_err();
        assert_eq!(error.to_string(), "duplicated gateway '10.0.0.1/24'");

        let mut vnet = campus();
        vnet.spec.sites[0].gateways = vec!["10.0.0.800/24".to_owned()];
        let error = translate_vnet(&storage, &vnet).await.unwrap_err();
        assert_eq!(error.to_string(), "invalid gateway '10.0.0.800/24'");
    }

    #[tokio::test]
    async fn reordered_remote_lists_are_not_drift() {
        let storage = seeded_storage().await;
        let spec = translate_vnet(&storage, &campus()).await.unwrap();

        let mut remote = reported();
        remote.ports.reverse();
        remote.gateways.reverse();

        assert!(!VNetSync::differs(&spec, &remote));

        let mut retagged = reported();
        retagged.ports[1].vlan = "60".to_owned();
        assert!(VNetSync::differs(&spec, &retagged));

        let mut disabled = reported();
        disabled.state = "disabled".to_owned();
        assert!(VNetSync::differs(&spec, &disabled));
    }

    #[tokio::test]
    async fn payload_carries_vlans_as_strings() {
        let storage = seeded_storage().await;
        let spec = translate_vnet(&storage, &campus()).await.unwrap();

        let payload = vnet_add(&spec);

        assert_eq!(payload.native_vlan, 1);
        assert_eq!(payload.tenant.name, "ops");
        assert_eq!(payload.gateways[0].prefix, "10.0.0.1/24");
        assert_eq!(payload.ports[0].vlan, "1");
        assert_eq!(payload.ports[1].vlan, "50");
        assert_eq!(payload.ports[0].state, "active");
    }

    #[test]
    fn status_reports_the_controller_state() {
        let remote = reported();

        let synced = VNetSync::status(SyncOutcome::Synced {
            state: ProvisionState::Active,
            remote: &remote,
        });
        assert_eq!(synced.status.as_deref(), Some("Active"));
        assert_eq!(synced.state.as_deref(), Some("active"));

        let failed = VNetSync::status(SyncOutcome::Failed {
            message: "invalid tenant 'ghost'".to_owned(),
        });
        assert_eq!(failed.status.as_deref(), Some("Failure"));
        assert!(failed.state.is_none());
    }
}

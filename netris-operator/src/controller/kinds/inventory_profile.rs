use async_trait::async_trait;
use itertools::Itertools;
use netris_operator_api::profiles;
use netris_operator_core::resources::crd::v1alpha1::{
    inventory_profile::{
        InventoryProfile, InventoryProfileCustomRule, InventoryProfileMeta,
        InventoryProfileMetaSpec,
    },
    ResourceStatus,
};

use crate::controller::{
    context::ReconcilerContext,
    error::ReconcilerError,
    sync::{ProvisionState, SyncKind, SyncOutcome},
    RequireMetadata,
};

use super::{added_id, ensure_ok};

pub struct InventoryProfileSync;

#[async_trait]
impl SyncKind for InventoryProfileSync {
    type Resource = InventoryProfile;
    type Meta = InventoryProfileMeta;
    type MetaSpec = InventoryProfileMetaSpec;
    type Id = u32;
    type Remote = profiles::Profile;
    type Status = ResourceStatus;

    const KIND: &'static str = "InventoryProfile";

    async fn translate(
        _context: &ReconcilerContext,
        resource: &InventoryProfile,
    ) -> Result<InventoryProfileMetaSpec, ReconcilerError> {
        translate_inventory_profile(resource)
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &InventoryProfileMeta,
    ) -> Result<Option<profiles::Profile>, ReconcilerError> {
        Ok(context
            .storage
            .profiles
            .find(|profile| profile.name == meta.spec.inventory_profile_name)
            .await)
    }

    fn remote_id(remote: &profiles::Profile) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &InventoryProfileMeta,
    ) -> Result<Option<profiles::Profile>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .profiles
            .find_refreshed(|profile| profile.id == id, || context.netris.list_profiles())
            .await)
    }

    async fn create(
        context: &ReconcilerContext,
        meta: &InventoryProfileMeta,
    ) -> Result<u32, ReconcilerError> {
        added_id(
            context
                .netris
                .add_profile(&profile_add(&meta.spec, None))
                .await?,
        )
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &InventoryProfileMeta,
        _current: &profiles::Profile,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_profile(meta.spec.id, &profile_add(&meta.spec, Some(meta.spec.id)))
                .await?,
        )
    }

    async fn delete(
        context: &ReconcilerContext,
        meta: &InventoryProfileMeta,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_profile(meta.spec.id).await?)
    }

    fn differs(spec: &InventoryProfileMetaSpec, remote: &profiles::Profile) -> bool {
        let rules_differ = !profile_rules(&spec.custom_rules)
            .iter()
            .sorted()
            .eq(remote.custom_rules.iter().sorted());

        remote.name != spec.inventory_profile_name
            || remote.description != spec.description
            || remote.tz_code() != spec.timezone
            || remote.ipv4_ssh != spec.allow_ssh_from_ipv4.join(",")
            || remote.ipv6_ssh != spec.allow_ssh_from_ipv6.join(",")
            || remote.ntp_servers != spec.ntp_servers.join(",")
            || remote.dns_servers != spec.dns_servers.join(",")
            || rules_differ
    }

    fn provision_state(_remote: &profiles::Profile) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, profiles::Profile>) -> ResourceStatus {
        outcome.resource_status()
    }
}

fn translate_inventory_profile(
    resource: &InventoryProfile,
) -> Result<InventoryProfileMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    Ok(InventoryProfileMetaSpec {
        inventory_profile_name: resource.require_name()?.to_owned(),
        description: spec.description.clone().unwrap_or_default(),
        timezone: spec.timezone.clone(),
        allow_ssh_from_ipv4: spec.allow_ssh_from_ipv4.clone(),
        allow_ssh_from_ipv6: spec.allow_ssh_from_ipv6.clone(),
        ntp_servers: spec.ntp_servers.clone(),
        dns_servers: spec.dns_servers.clone(),
        custom_rules: spec.custom_rules.clone(),
        ..Default::default()
    })
}

fn profile_add(spec: &InventoryProfileMetaSpec, id: Option<u32>) -> profiles::ProfileAdd {
    profiles::ProfileAdd {
        id,
        name: spec.inventory_profile_name.clone(),
        description: spec.description.clone(),
        timezone: profiles::TimezoneRef {
            label: spec.timezone.clone(),
            tz_code: spec.timezone.clone(),
        },
        ipv4_list: spec.allow_ssh_from_ipv4.join(","),
        ipv6_list: spec.allow_ssh_from_ipv6.join(","),
        ntp_servers: spec.ntp_servers.join(","),
        dns_servers: spec.dns_servers.join(","),
        custom_rules: profile_rules(&spec.custom_rules),
    }
}

fn profile_rules(rules: &[InventoryProfileCustomRule]) -> Vec<profiles::CustomRule> {
    rules
        .iter()
        .map(|rule| profiles::CustomRule {
            src_subnet: rule.src_subnet.clone(),
            src_port: rule.src_port.clone().unwrap_or_default(),
            dst_port: rule.dst_port.clone().unwrap_or_default(),
            protocol: rule.protocol.as_str().to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use netris_operator_core::resources::crd::v1alpha1::inventory_profile::RuleProtocol;

    use super::*;

    fn rule(subnet: &str, dst: &str) -> InventoryProfileCustomRule {
        InventoryProfileCustomRule {
            src_subnet: subnet.to_owned(),
            src_port: None,
            dst_port: Some(dst.to_owned()),
            protocol: RuleProtocol::Tcp,
        }
    }

    fn translated() -> InventoryProfileMetaSpec {
        InventoryProfileMetaSpec {
            inventory_profile_name: "compute".to_owned(),
            timezone: "Asia/Yerevan".to_owned(),
            allow_ssh_from_ipv4: vec!["10.0.0.0/8".to_owned(), "172.16.0.0/12".to_owned()],
            ntp_servers: vec!["ntp.example.com".to_owned()],
            custom_rules: vec![rule("10.1.0.0/16", "8443"), rule("10.2.0.0/16", "9100")],
            ..Default::default()
        }
    }

    fn remote() -> profiles::Profile {
        profiles::Profile {
            id: 3,
            name: "compute".to_owned(),
            timezone: r#"{"label":"Asia/Yerevan","tzCode":"Asia/Yerevan"}"#.to_owned(),
            ipv4_ssh: "10.0.0.0/8,172.16.0.0/12".to_owned(),
            ntp_servers: "ntp.example.com".to_owned(),
            custom_rules: profile_rules(&[rule("10.2.0.0/16", "9100"), rule("10.1.0.0/16", "8443")]),
            ..Default::default()
        }
    }

    #[test]
    fn payload_joins_the_address_lists() {
        let payload = profile_add(&translated(), None);

        assert_eq!(payload.ipv4_list, "10.0.0.0/8,172.16.0.0/12");
        assert_eq!(payload.timezone.tz_code, "Asia/Yerevan");
        assert_eq!(payload.custom_rules[0].protocol, "tcp");
        assert_eq!(payload.custom_rules[0].src_port, "");
    }

    #[test]
    fn rule_order_is_not_drift() {
        assert!(!InventoryProfileSync::differs(&translated(), &remote()));
    }

    #[test]
    fn rule_and_timezone_changes_are_drift() {
        let spec = translated();

        let mut rerouted = remote();
        rerouted.custom_rules[0].dst_port = "9101".to_owned();
        assert!(InventoryProfileSync::differs(&spec, &rerouted));

        let mut rezoned = remote();
        rezoned.timezone = r#"{"label":"UTC","tzCode":"UTC"}"#.to_owned();
        assert!(InventoryProfileSync::differs(&spec, &rezoned));
    }
}

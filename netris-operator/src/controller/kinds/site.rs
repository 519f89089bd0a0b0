use async_trait::async_trait;
use netris_operator_api::sites;
use netris_operator_core::resources::crd::v1alpha1::{
    site::{Site, SiteMeta, SiteMetaSpec},
    ResourceStatus,
};

use crate::controller::{
    context::ReconcilerContext,
    error::ReconcilerError,
    sync::{ProvisionState, SyncKind, SyncOutcome},
    RequireMetadata,
};

use super::{added_id, ensure_ok};

pub struct SiteSync;

#[async_trait]
impl SyncKind for SiteSync {
    type Resource = Site;
    type Meta = SiteMeta;
    type MetaSpec = SiteMetaSpec;
    type Id = u32;
    type Remote = sites::Site;
    type Status = ResourceStatus;

    const KIND: &'static str = "Site";

    async fn translate(
        _context: &ReconcilerContext,
        resource: &Site,
    ) -> Result<SiteMetaSpec, ReconcilerError> {
        translate_site(resource)
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &SiteMeta,
    ) -> Result<Option<sites::Site>, ReconcilerError> {
        Ok(context
            .storage
            .sites
            .find(|site| site.name == meta.spec.site_name)
            .await)
    }

    fn remote_id(remote: &sites::Site) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &SiteMeta,
    ) -> Result<Option<sites::Site>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .sites
            .find_refreshed(|site| site.id == id, || context.netris.list_sites())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &SiteMeta) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_site(&site_add(&meta.spec, None)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &SiteMeta,
        _current: &sites::Site,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_site(&site_add(&meta.spec, Some(meta.spec.id)))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &SiteMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_site(meta.spec.id).await?)
    }

    fn differs(spec: &SiteMetaSpec, remote: &sites::Site) -> bool {
        remote.name != spec.site_name
            || remote.public_asn != spec.public_asn
            || remote.physical_instance_asn != spec.roh_asn
            || remote.virtual_instance_asn != spec.vm_asn
            || remote.routing_profile_id != spec.roh_routing_profile
            || remote.vpn != spec.site_mesh.as_str()
            || remote.acl_policy != spec.acl_default_policy.as_str()
    }

    fn provision_state(_remote: &sites::Site) -> ProvisionState {
        ProvisionState::Active
    }

    fn status(outcome: SyncOutcome<'_, sites::Site>) -> ResourceStatus {
        outcome.resource_status()
    }
}

fn translate_site(resource: &Site) -> Result<SiteMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    Ok(SiteMetaSpec {
        site_name: resource.require_name()?.to_owned(),
        public_asn: spec.public_asn,
        roh_asn: spec.roh_asn,
        vm_asn: spec.vm_asn,
        roh_routing_profile: spec.roh_routing_profile.remote_id(),
        site_mesh: spec.site_mesh,
        acl_default_policy: spec.acl_default_policy,
        ..Default::default()
    })
}

fn site_add(spec: &SiteMetaSpec, id: Option<u32>) -> sites::SiteAdd {
    sites::SiteAdd {
        id,
        name: spec.site_name.clone(),
        public_asn: spec.public_asn,
        physical_instance_asn: spec.roh_asn,
        virtual_instance_asn: spec.vm_asn,
        vpn: spec.site_mesh.as_str().to_owned(),
        acl_policy: spec.acl_default_policy.as_str().to_owned(),
        routing_profile_id: spec.roh_routing_profile,
    }
}

#[cfg(test)]
mod tests {
    use netris_operator_core::resources::crd::v1alpha1::site::{
        AclPolicy, RoutingProfile, SiteMesh, SiteSpec,
    };

    use super::*;

    fn translated() -> SiteMetaSpec {
        SiteMetaSpec {
            site_name: "yerevan".to_owned(),
            public_asn: 65001,
            roh_asn: 65500,
            vm_asn: 65501,
            roh_routing_profile: RoutingProfile::Default.remote_id(),
            site_mesh: SiteMesh::Hub,
            acl_default_policy: AclPolicy::Permit,
            ..Default::default()
        }
    }

    fn remote() -> sites::Site {
        sites::Site {
            id: 12,
            name: "yerevan".to_owned(),
            public_asn: 65001,
            physical_instance_asn: 65500,
            virtual_instance_asn: 65501,
            routing_profile_id: 1,
            vpn: "hub".to_owned(),
            acl_policy: "permit".to_owned(),
        }
    }

    #[test]
    fn translation_resolves_the_routing_profile() {
        let site = Site::new(
            "yerevan",
            SiteSpec {
                public_asn: 65001,
                roh_asn: 65500,
                vm_asn: 65501,
                roh_routing_profile: RoutingProfile::DefaultAgg,
                site_mesh: SiteMesh::Hub,
                acl_default_policy: AclPolicy::Deny,
            },
        );

        let spec = translate_site(&site).unwrap();

        assert_eq!(spec.site_name, "yerevan");
        assert_eq!(spec.roh_routing_profile, 2);
        assert_eq!(spec.acl_default_policy, AclPolicy::Deny);
        assert!(!spec.imported);
    }

    #[test]
    fn matching_remote_reports_no_drift() {
        assert!(!SiteSync::differs(&translated(), &remote()));
    }

    #[test]
    fn asn_and_mesh_changes_are_drift() {
        let spec = translated();

        let mut renumbered = remote();
        renumbered.public_asn = 65009;
        assert!(SiteSync::differs(&spec, &renumbered));

        let mut remeshed = remote();
        remeshed.vpn = "spoke".to_owned();
        assert!(SiteSync::differs(&spec, &remeshed));
    }

    #[test]
    fn update_payload_carries_the_remote_id() {
        let payload = site_add(&translated(), Some(12));

        assert_eq!(payload.id, Some(12));
        assert_eq!(payload.vpn, "hub");
        assert_eq!(payload.routing_profile_id, 1);
    }
}

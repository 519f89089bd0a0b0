use std::collections::{BTreeMap, BTreeSet};

use netris_operator_core::resources::crd::v1alpha1::l4lb::{L4LBBackend, L4LB};

/// Changes needed to make the generated L4LB set match the cluster, plus the
/// frontend addresses each service's status should advertise.
#[derive(Default)]
pub struct LoadBalancerDiff {
    pub create: Vec<L4LB>,
    pub update: Vec<L4LB>,
    pub delete: Vec<L4LB>,
    /// service UID → addresses to write into `status.loadBalancer.ingress`
    pub ingress: BTreeMap<String, BTreeSet<String>>,
}

/// Compares the service-owned L4LBs on the cluster with the generated set.
///
/// Matching is by name, which encodes service, namespace, UID, protocol and
/// port. A matched L4LB keeps its frontend except when the service pins an
/// explicit address; the `main`/`child` roles assigned at apply time decide
/// how automatic frontends propagate within one service's group.
pub fn compare(existing: &[L4LB], desired: Vec<L4LB>) -> LoadBalancerDiff {
    let mut diff = LoadBalancerDiff::default();

    let existing_by_name: BTreeMap<&str, &L4LB> = existing
        .iter()
        .filter_map(|lb| lb.metadata.name.as_deref().map(|name| (name, lb)))
        .collect();
    let desired_names: BTreeSet<String> = desired
        .iter()
        .filter_map(|lb| lb.metadata.name.clone())
        .collect();

    // frontends already assigned to a service's group; new siblings inherit
    // them instead of asking the controller for another address
    let mut known_ips: BTreeMap<String, String> = BTreeMap::new();
    for lb in &desired {
        if let (Some(name), Some(uid)) = (lb.metadata.name.as_deref(), lb.service_uid()) {
            if let Some(ip) = existing_by_name
                .get(name)
                .and_then(|current| current.spec.frontend.ip.clone())
            {
                known_ips.insert(uid.to_owned(), ip);
            }
        }
    }

    // what the service currently advertises vs. what its L4LBs serve
    let mut advertised: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut provisioned: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut auto_ips: BTreeMap<String, String> = BTreeMap::new();

    for lb in desired {
        let uid = lb.service_uid().unwrap_or_default().to_owned();

        let announced = advertised.entry(uid.clone()).or_default();
        for ip in lb
            .service_ingress_ips()
            .unwrap_or_default()
            .split(',')
            .filter(|ip| !ip.is_empty())
        {
            announced.insert(ip.to_owned());
        }

        let name = match lb.metadata.name.as_deref() {
            Some(name) => name,
            None => continue,
        };

        match existing_by_name.get(name) {
            Some(current) => {
                let mut updated = (*current).clone();
                updated.set_service_name(lb.service_name().unwrap_or_default());
                updated.set_service_namespace(lb.service_namespace().unwrap_or_default());
                updated.set_service_uid(&uid);
                updated.set_service_ingress_ips(lb.service_ingress_ips().unwrap_or_default());

                let mut update = false;

                if let Some(ip) = updated
                    .status
                    .as_ref()
                    .and_then(|status| status.ip.clone())
                    .filter(|ip| !ip.is_empty())
                {
                    provisioned.entry(uid.clone()).or_default().insert(ip.clone());
                    if updated.ip_role() == Some("main") {
                        auto_ips.insert(uid.clone(), ip);
                    }
                }

                // a child's frontend follows the group's main, everything
                // else follows the service spec
                if (lb.spec.frontend.ip.is_some() || updated.ip_role() != Some("child"))
                    && lb.spec.frontend.ip != updated.spec.frontend.ip
                {
                    updated.spec.frontend.ip = lb.spec.frontend.ip.clone();
                    update = true;
                }

                if !update && updated.ip_role() == Some("child") {
                    if let Some(ip) = auto_ips.get(&uid) {
                        if updated.spec.frontend.ip.as_deref() != Some(ip) {
                            updated.spec.frontend.ip = Some(ip.clone());
                            update = true;
                        }
                    }
                }

                if lb.spec.check.timeout != updated.spec.check.timeout {
                    updated.spec.check.timeout = lb.spec.check.timeout;
                    update = true;
                }

                if !backends_match(&lb.spec.backend, &updated.spec.backend) {
                    updated.spec.backend = lb.spec.backend.clone();
                    update = true;
                }

                if update {
                    diff.update.push(updated);
                }
            }
            None => {
                let mut created = lb;
                if created.spec.frontend.ip.is_none() {
                    if let Some(ip) = known_ips.get(&uid) {
                        created.spec.frontend.ip = Some(ip.clone());
                    }
                }
                diff.create.push(created);
            }
        }
    }

    for lb in existing {
        let orphaned = lb
            .metadata
            .name
            .as_deref()
            .map(|name| !desired_names.contains(name))
            .unwrap_or(false);
        if orphaned {
            diff.delete.push(lb.clone());
        }
    }

    for (uid, announced) in advertised {
        let serving = provisioned.get(&uid).cloned().unwrap_or_default();
        if serving != announced {
            diff.ingress.insert(uid, serving);
        }
    }

    diff
}

/// Backend lists match regardless of order or duplicates.
pub fn backends_match(left: &[L4LBBackend], right: &[L4LBBackend]) -> bool {
    left.iter().collect::<BTreeSet<_>>() == right.iter().collect::<BTreeSet<_>>()
}

#[cfg(test)]
mod tests {
    use netris_operator_core::resources::crd::v1alpha1::l4lb::{
        L4LBCheck, L4LBFrontend, L4LBSpec, L4LBStatus,
    };

    use super::*;

    fn lb(name: &str, uid: &str, ip: Option<&str>, backends: &[&str]) -> L4LB {
        let mut lb = L4LB::new(
            name,
            L4LBSpec {
                frontend: L4LBFrontend {
                    port: 80,
                    ip: ip.map(str::to_owned),
                    subnet: None,
                },
                check: L4LBCheck {
                    timeout: Some(2000),
                    ..Default::default()
                },
                backend: backends
                    .iter()
                    .map(|backend| L4LBBackend((*backend).to_owned()))
                    .collect(),
                ..Default::default()
            },
        );
        lb.metadata.namespace = Some("default".to_owned());
        lb.set_service_name("web");
        lb.set_service_namespace("default");
        lb.set_service_uid(uid);
        lb.set_service_ingress_ips("");
        lb
    }

    #[test]
    fn unmatched_generated_l4lbs_are_created() {
        let desired = vec![lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"])];

        let diff = compare(&[], desired);
        assert_eq!(diff.create.len(), 1);
        assert!(diff.update.is_empty());
        assert!(diff.delete.is_empty());
    }

    #[test]
    fn drifted_backends_trigger_an_update() {
        let existing = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            None,
            &["10.0.0.5:30080"],
        )];
        let desired = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            None,
            &["10.0.0.5:30080", "10.0.0.6:30080"],
        )];

        let diff = compare(&existing, desired);
        assert!(diff.create.is_empty());
        assert_eq!(diff.update.len(), 1);
        assert_eq!(diff.update[0].spec.backend.len(), 2);
    }

    #[test]
    fn reordered_backends_are_not_drift() {
        let existing = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            None,
            &["10.0.0.6:30080", "10.0.0.5:30080"],
        )];
        let desired = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            None,
            &["10.0.0.5:30080", "10.0.0.6:30080"],
        )];

        let diff = compare(&existing, desired);
        assert!(diff.update.is_empty());
    }

    #[test]
    fn orphaned_l4lbs_are_deleted() {
        let existing = vec![lb("gone-default-u9-tcp-80", "u9", None, &["10.0.0.5:30080"])];

        let diff = compare(&existing, Vec::new());
        assert_eq!(diff.delete.len(), 1);
        assert_eq!(
            diff.delete[0].metadata.name.as_deref(),
            Some("gone-default-u9-tcp-80")
        );
    }

    #[test]
    fn pinned_frontend_overrides_the_assigned_one() {
        let existing = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            Some("198.51.100.3"),
            &["10.0.0.5:30080"],
        )];
        let desired = vec![lb(
            "web-default-u1-tcp-80",
            "u1",
            Some("203.0.113.9"),
            &["10.0.0.5:30080"],
        )];

        let diff = compare(&existing, desired);
        assert_eq!(diff.update.len(), 1);
        assert_eq!(
            diff.update[0].spec.frontend.ip.as_deref(),
            Some("203.0.113.9")
        );
    }

    #[test]
    fn children_keep_following_the_main_frontend() {
        let mut main = lb(
            "web-default-u1-tcp-80",
            "u1",
            None,
            &["10.0.0.5:30080"],
        );
        main.set_ip_role("main");
        main.status = Some(L4LBStatus {
            ip: Some("198.51.100.3".to_owned()),
            ..Default::default()
        });

        let mut child = lb(
            "web-default-u1-tcp-443",
            "u1",
            Some("198.51.100.99"),
            &["10.0.0.5:30443"],
        );
        child.set_ip_role("child");

        let mut desired_main = lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"]);
        let mut desired_child = lb("web-default-u1-tcp-443", "u1", None, &["10.0.0.5:30443"]);
        desired_main.set_service_ingress_ips("");
        desired_child.set_service_ingress_ips("");

        let diff = compare(&[main, child], vec![desired_main, desired_child]);

        assert_eq!(diff.update.len(), 1);
        assert_eq!(
            diff.update[0].metadata.name.as_deref(),
            Some("web-default-u1-tcp-443")
        );
        assert_eq!(
            diff.update[0].spec.frontend.ip.as_deref(),
            Some("198.51.100.3")
        );
    }

    #[test]
    fn ingress_is_rewritten_when_it_disagrees_with_the_l4lbs() {
        let mut existing = lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"]);
        existing.status = Some(L4LBStatus {
            ip: Some("198.51.100.3".to_owned()),
            ..Default::default()
        });

        let mut desired = lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"]);
        desired.set_service_ingress_ips("203.0.113.1");

        let diff = compare(&[existing], vec![desired]);

        let serving = diff.ingress.get("u1").unwrap();
        assert_eq!(
            serving.iter().collect::<Vec<_>>(),
            vec!["198.51.100.3"]
        );
    }

    #[test]
    fn matching_ingress_is_left_alone() {
        let mut existing = lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"]);
        existing.status = Some(L4LBStatus {
            ip: Some("198.51.100.3".to_owned()),
            ..Default::default()
        });

        let mut desired = lb("web-default-u1-tcp-80", "u1", None, &["10.0.0.5:30080"]);
        desired.set_service_ingress_ips("198.51.100.3");

        let diff = compare(&[existing], vec![desired]);
        assert!(diff.ingress.is_empty());
    }
}

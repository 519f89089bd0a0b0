use async_trait::async_trait;
use itertools::Itertools;
use netris_operator_api::{l4lbs, subnets};
use netris_operator_core::{
    config::OperatorConfig,
    resources::crd::v1alpha1::l4lb::{
        CheckType, L4LBMeta, L4LBMetaBackend, L4LBMetaSpec, L4LBProtocol, L4LBState, L4LBStatus,
        L4LB,
    },
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

const DEFAULT_CHECK_TIMEOUT: &str = "2000";

pub struct L4LBSync;

#[async_trait]
impl SyncKind for L4LBSync {
    type Resource = L4LB;
    type Meta = L4LBMeta;
    type MetaSpec = L4LBMetaSpec;
    type Id = u32;
    type Remote = l4lbs::LoadBalancer;
    type Status = L4LBStatus;

    const KIND: &'static str = "L4LB";

    async fn translate(
        context: &ReconcilerContext,
        resource: &L4LB,
    ) -> Result<L4LBMetaSpec, ReconcilerError> {
        translate_l4lb(&context.config, &context.storage, resource).await
    }

    async fn find_by_name(
        context: &ReconcilerContext,
        meta: &L4LBMeta,
    ) -> Result<Option<l4lbs::LoadBalancer>, ReconcilerError> {
        Ok(context
            .storage
            .l4lbs
            .find(|l4lb| l4lb.name == meta.spec.l4lb_name)
            .await)
    }

    fn remote_id(remote: &l4lbs::LoadBalancer) -> u32 {
        remote.id
    }

    async fn fetch(
        context: &ReconcilerContext,
        meta: &L4LBMeta,
    ) -> Result<Option<l4lbs::LoadBalancer>, ReconcilerError> {
        let id = meta.spec.id;

        Ok(context
            .storage
            .l4lbs
            .find_refreshed(|l4lb| l4lb.id == id, || context.netris.list_l4lbs())
            .await)
    }

    async fn create(context: &ReconcilerContext, meta: &L4LBMeta) -> Result<u32, ReconcilerError> {
        added_id(context.netris.add_l4lb(&l4lb_add(&meta.spec)).await?)
    }

    async fn update(
        context: &ReconcilerContext,
        meta: &L4LBMeta,
        current: &l4lbs::LoadBalancer,
    ) -> Result<(), ReconcilerError> {
        ensure_ok(
            context
                .netris
                .update_l4lb(meta.spec.id, &l4lb_update(&meta.spec, current))
                .await?,
        )
    }

    async fn delete(context: &ReconcilerContext, meta: &L4LBMeta) -> Result<(), ReconcilerError> {
        ensure_ok(context.netris.delete_l4lb(meta.spec.id).await?)
    }

    fn differs(spec: &L4LBMetaSpec, remote: &l4lbs::LoadBalancer) -> bool {
        if remote.name != spec.l4lb_name
            || remote.ip != spec.ip
            || remote.automatic != spec.automatic
            || remote.port != spec.port
            || remote.protocol != spec.protocol
            || remote.site_id != spec.site_id
            || remote.tenant_id != spec.tenant_id
            || remote.status != spec.status
        {
            return true;
        }

        remote_health_check(remote)
            != (
                spec.health_check.as_str(),
                spec.timeout.as_str(),
                spec.request_path.as_str(),
            )
            || !backends_match(&spec.backend, &remote.backends)
    }

    fn provision_state(remote: &l4lbs::LoadBalancer) -> ProvisionState {
        if remote.label.text.eq_ignore_ascii_case("provisioning") {
            ProvisionState::Provisioning
        } else {
            ProvisionState::Active
        }
    }

    fn status(outcome: SyncOutcome<'_, l4lbs::LoadBalancer>) -> L4LBStatus {
        let (modified, ip) = match &outcome {
            SyncOutcome::Synced { remote, .. } => (
                modified_timestamp(remote.modified_date),
                (!remote.ip.is_empty()).then(|| remote.ip.clone()),
            ),
            _ => (None, None),
        };
        let base = outcome.resource_status();

        L4LBStatus {
            status: base.status,
            message: base.message,
            modified,
            ip,
        }
    }
}

async fn translate_l4lb(
    config: &OperatorConfig,
    storage: &Storage,
    resource: &L4LB,
) -> Result<L4LBMetaSpec, ReconcilerError> {
    let spec = &resource.spec;

    let mut backends = Vec::with_capacity(spec.backend.len());
    let mut probe = String::new();
    for backend in &spec.backend {
        let (ip, port) = backend.ip_port().ok_or_else(|| {
            ReconcilerError::TranslateError(format!("Invalid backend '{}'", backend.0).into())
        })?;
        probe = ip.to_owned();
        backends.push(L4LBMetaBackend {
            ip: ip.to_owned(),
            port,
            maintenance: false,
        });
    }

    // tenant falls back to the operator default, then to whichever subnet
    // holds the backend addresses
    let mut tenant_id = 0;
    let mut tenant_name = spec.owner_tenant.as_str();
    if tenant_name.is_empty() {
        match &config.l4lb_tenant {
            Some(default) => tenant_name = default,
            None => tenant_id = backend_subnet(storage, &probe).await?.tenant.id,
        }
    }
    if tenant_id == 0 {
        tenant_id = storage
            .tenants
            .find(|tenant| tenant.name == tenant_name)
            .await
            .map(|tenant| tenant.id)
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("Tenant '{tenant_name}' not found").into())
            })?;
    }

    let site_id = if spec.site.is_empty() {
        backend_subnet(storage, &probe)
            .await?
            .sites
            .first()
            .map(|site| site.id)
            .ok_or_else(|| {
                ReconcilerError::TranslateError(
                    format!("There are no sites for specified IP address {probe}").into(),
                )
            })?
    } else {
        storage
            .sites
            .find(|site| site.name == spec.site)
            .await
            .map(|site| site.id)
            .ok_or_else(|| {
                ReconcilerError::TranslateError(format!("'{}' site not found", spec.site).into())
            })?
    };

    let status = match spec.state.unwrap_or_default() {
        L4LBState::Active => "enable".to_owned(),
        L4LBState::Disabled => "disabled".to_owned(),
    };

    let protocol = spec.protocol.unwrap_or_default();
    let (health_check, timeout, request_path) = match protocol {
        L4LBProtocol::Tcp => {
            let timeout = match spec.check.timeout {
                Some(timeout) if timeout != 0 => timeout.to_string(),
                _ => DEFAULT_CHECK_TIMEOUT.to_owned(),
            };
            match spec.check.type_.unwrap_or_default() {
                CheckType::Tcp => ("TCP".to_owned(), timeout, String::new()),
                CheckType::Http => (
                    "HTTP".to_owned(),
                    timeout,
                    spec.check.request_path.clone().unwrap_or_default(),
                ),
            }
        }
        // the controller health-checks UDP frontends on its own
        L4LBProtocol::Udp => (String::new(), String::new(), String::new()),
    };

    let ip = spec.frontend.ip.clone().unwrap_or_default();

    Ok(L4LBMetaSpec {
        l4lb_name: resource.require_name()?.to_owned(),
        tenant_id,
        site_id,
        automatic: ip.is_empty(),
        protocol: protocol.as_str().to_uppercase(),
        ip,
        port: spec.frontend.port,
        status,
        health_check,
        timeout,
        request_path,
        backend: backends,
        ..Default::default()
    })
}

async fn backend_subnet(
    storage: &Storage,
    probe: &str,
) -> Result<subnets::Subnet, ReconcilerError> {
    let parsed = probe.parse().ok();
    let subnet = match parsed {
        Some(ip) => storage.find_subnet_by_ip(ip).await,
        None => None,
    };

    subnet.ok_or_else(|| {
        ReconcilerError::TranslateError(
            format!("There are no subnets for specified IP address {probe}").into(),
        )
    })
}

fn l4lb_add(spec: &L4LBMetaSpec) -> l4lbs::LoadBalancerAdd {
    l4lbs::LoadBalancerAdd {
        name: spec.l4lb_name.clone(),
        tenant: spec.tenant_id,
        site_id: spec.site_id,
        automatic: spec.automatic,
        protocol: spec.protocol.clone(),
        // an automatic frontend lets the controller pick the address
        ip: if spec.automatic {
            String::new()
        } else {
            spec.ip.clone()
        },
        port: spec.port,
        status: spec.status.clone(),
        health_check: spec.health_check.clone(),
        request_path: spec.request_path.clone(),
        timeout: spec.timeout.clone(),
        backend: spec
            .backend
            .iter()
            .map(|backend| l4lbs::BackendAdd {
                ip: backend.ip.clone(),
                port: backend.port,
            })
            .collect(),
    }
}

fn l4lb_update(spec: &L4LBMetaSpec, current: &l4lbs::LoadBalancer) -> l4lbs::LoadBalancerUpdate {
    l4lbs::LoadBalancerUpdate {
        tenant_id: spec.tenant_id,
        name: spec.l4lb_name.clone(),
        site_id: spec.site_id,
        site_name: current.site_name.clone(),
        automatic: spec.automatic,
        protocol: spec.protocol.clone(),
        ip: spec.ip.clone(),
        port: spec.port,
        status: spec.status.clone(),
        health_check: spec.health_check.clone(),
        request_path: spec.request_path.clone(),
        timeout: spec.timeout.clone(),
        backend: spec
            .backend
            .iter()
            .map(|backend| l4lbs::BackendUpdate {
                ip: backend.ip.clone(),
                port: backend.port,
            })
            .collect(),
    }
}

/// Folds the controller's two-probe health check into the flat
/// kind/timeout/path triple kept on the meta spec.
fn remote_health_check(remote: &l4lbs::LoadBalancer) -> (&str, &str, &str) {
    let check = &remote.health_check;
    if !check.tcp.timeout.is_empty() {
        (
            "TCP",
            check.tcp.timeout.as_str(),
            check.tcp.request_path.as_str(),
        )
    } else if !check.http.timeout.is_empty() {
        (
            "HTTP",
            check.http.timeout.as_str(),
            check.http.request_path.as_str(),
        )
    } else {
        ("", "", "")
    }
}

fn backends_match(spec: &[L4LBMetaBackend], remote: &[l4lbs::Backend]) -> bool {
    spec.iter()
        .map(|backend| (backend.ip.clone(), backend.port.to_string()))
        .sorted()
        .eq(remote
            .iter()
            .map(|backend| (backend.ip.clone(), backend.port.clone()))
            .sorted())
}

#[cfg(test)]
mod tests {
    use netris_operator_api::{sites::Site, subnets::Subnet, tenants::Tenant, IdName};
    use netris_operator_core::resources::crd::v1alpha1::l4lb::{L4LBCheck, L4LBFrontend, L4LBSpec};

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
            .replace(vec![Tenant {
                id: 2,
                name: "Admin".to_owned(),
            }])
            .await;
        storage
            .subnets
            .replace(vec![Subnet {
                id: 12,
                prefix: "192.0.2.0/24".to_owned(),
                tenant: IdName::named(7, "workloads"),
                sites: vec![IdName::named(3, "yerevan")],
                ..Default::default()
            }])
            .await;

        storage
    }

    fn l4lb(spec: L4LBSpec) -> L4LB {
        L4LB::new("web", spec)
    }

    #[tokio::test]
    async fn translation_fills_tcp_check_defaults() {
        let storage = seeded_storage().await;
        let resource = l4lb(L4LBSpec {
            owner_tenant: "Admin".to_owned(),
            site: "yerevan".to_owned(),
            frontend: L4LBFrontend {
                port: 443,
                ..Default::default()
            },
            backend: vec!["192.0.2.5:30443".to_owned().into()],
            ..Default::default()
        });

        let spec = translate_l4lb(&OperatorConfig::default(), &storage, &resource)
            .await
            .unwrap();
        assert_eq!(spec.l4lb_name, "web");
        assert_eq!(spec.tenant_id, 2);
        assert_eq!(spec.site_id, 3);
        assert_eq!(spec.protocol, "TCP");
        assert_eq!(spec.status, "enable");
        assert_eq!(spec.health_check, "TCP");
        assert_eq!(spec.timeout, "2000");
        assert!(spec.automatic);
        assert_eq!(
            spec.backend,
            vec![L4LBMetaBackend {
                ip: "192.0.2.5".to_owned(),
                port: 30443,
                maintenance: false,
            }]
        );
    }

    #[tokio::test]
    async fn placement_falls_back_to_the_backend_subnet() {
        let storage = seeded_storage().await;
        let resource = l4lb(L4LBSpec {
            frontend: L4LBFrontend {
                port: 80,
                ..Default::default()
            },
            backend: vec!["192.0.2.9:30080".to_owned().into()],
            ..Default::default()
        });

        let spec = translate_l4lb(&OperatorConfig::default(), &storage, &resource)
            .await
            .unwrap();
        assert_eq!(spec.tenant_id, 7);
        assert_eq!(spec.site_id, 3);

        // an operator-level default shortcuts the subnet lookup
        let config = OperatorConfig {
            l4lb_tenant: Some("Admin".to_owned()),
            ..Default::default()
        };
        let spec = translate_l4lb(&config, &storage, &resource).await.unwrap();
        assert_eq!(spec.tenant_id, 2);
    }

    #[tokio::test]
    async fn stray_backends_fail_translation() {
        let storage = seeded_storage().await;

        let unparsable = l4lb(L4LBSpec {
            backend: vec!["192.0.2.5".to_owned().into()],
            ..Default::default()
        });
        let error = translate_l4lb(&OperatorConfig::default(), &storage, &unparsable)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Invalid backend '192.0.2.5'");

        let unhomed = l4lb(L4LBSpec {
            backend: vec!["198.51.100.4:30080".to_owned().into()],
            ..Default::default()
        });
        let error = translate_l4lb(&OperatorConfig::default(), &storage, &unhomed)
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "There are no subnets for specified IP address 198.51.100.4"
        );
    }

    #[tokio::test]
    async fn udp_frontends_carry_no_health_check() {
        let storage = seeded_storage().await;
        let resource = l4lb(L4LBSpec {
            owner_tenant: "Admin".to_owned(),
            site: "yerevan".to_owned(),
            protocol: Some(L4LBProtocol::Udp),
            state: Some(L4LBState::Disabled),
            check: L4LBCheck {
                timeout: Some(5000),
                ..Default::default()
            },
            frontend: L4LBFrontend {
                port: 53,
                ip: Some("203.0.113.10".to_owned()),
                ..Default::default()
            },
            backend: vec!["192.0.2.5:30053".to_owned().into()],
            ..Default::default()
        });

        let spec = translate_l4lb(&OperatorConfig::default(), &storage, &resource)
            .await
            .unwrap();
        assert_eq!(spec.protocol, "UDP");
        assert_eq!(spec.status, "disabled");
        assert_eq!(spec.health_check, "");
        assert_eq!(spec.timeout, "");
        assert!(!spec.automatic);
        assert_eq!(spec.ip, "203.0.113.10");
    }

    fn translated() -> L4LBMetaSpec {
        L4LBMetaSpec {
            l4lb_name: "web".to_owned(),
            tenant_id: 2,
            site_id: 3,
            automatic: false,
            protocol: "TCP".to_owned(),
            ip: "203.0.113.10".to_owned(),
            port: 443,
            status: "enable".to_owned(),
            health_check: "TCP".to_owned(),
            timeout: "2000".to_owned(),
            backend: vec![
                L4LBMetaBackend {
                    ip: "192.0.2.5".to_owned(),
                    port: 30443,
                    maintenance: false,
                },
                L4LBMetaBackend {
                    ip: "192.0.2.6".to_owned(),
                    port: 30443,
                    maintenance: false,
                },
            ],
            ..Default::default()
        }
    }

    fn remote() -> l4lbs::LoadBalancer {
        l4lbs::LoadBalancer {
            id: 44,
            name: "web".to_owned(),
            tenant_id: 2,
            site_id: 3,
            automatic: false,
            protocol: "TCP".to_owned(),
            ip: "203.0.113.10".to_owned(),
            port: 443,
            status: "enable".to_owned(),
            health_check: l4lbs::HealthCheck {
                tcp: l4lbs::HealthCheckProbe {
                    timeout: "2000".to_owned(),
                    request_path: String::new(),
                },
                ..Default::default()
            },
            backends: vec![
                l4lbs::Backend {
                    ip: "192.0.2.6".to_owned(),
                    port: "30443".to_owned(),
                },
                l4lbs::Backend {
                    ip: "192.0.2.5".to_owned(),
                    port: "30443".to_owned(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn backend_order_is_not_drift() {
        assert!(!L4LBSync::differs(&translated(), &remote()));
    }

    #[test]
    fn check_and_backend_changes_are_drift() {
        let mut slow_check = remote();
        slow_check.health_check.tcp.timeout = "5000".to_owned();
        assert!(L4LBSync::differs(&translated(), &slow_check));

        let mut drained = remote();
        drained.backends.pop();
        assert!(L4LBSync::differs(&translated(), &drained));

        let mut disabled = remote();
        disabled.status = "disabled".to_owned();
        assert!(L4LBSync::differs(&translated(), &disabled));
    }

    #[test]
    fn add_payload_strips_automatic_addresses() {
        let mut spec = translated();
        spec.automatic = true;

        let payload = l4lb_add(&spec);
        assert_eq!(payload.ip, "");
        assert!(payload.automatic);
        assert_eq!(payload.backend.len(), 2);
        assert_eq!(payload.health_check, "TCP");
    }

    #[test]
    fn provisioning_label_maps_to_provisioning() {
        let mut remote = remote();
        remote.label.text = "provisioning".to_owned();
        assert_eq!(
            L4LBSync::provision_state(&remote),
            ProvisionState::Provisioning
        );

        remote.label.text = "OK".to_owned();
        assert_eq!(L4LBSync::provision_state(&remote), ProvisionState::Active);
    }

    #[test]
    fn status_reports_the_served_address() {
        let remote = remote();
        let status = L4LBSync::status(SyncOutcome::Synced {
            state: ProvisionState::Active,
            remote: &remote,
        });

        assert_eq!(status.status.as_deref(), Some("Active"));
        assert_eq!(status.ip.as_deref(), Some("203.0.113.10"));
    }
}

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::{Pod, Service};
use kube::ResourceExt;
use netris_operator_core::resources::crd::v1alpha1::l4lb::{
    CheckType, L4LBBackend, L4LBCheck, L4LBFrontend, L4LBProtocol, L4LBSpec, L4LBState, L4LB,
};

/// Services annotated this way never get L4LBs generated for them.
pub const IGNORE_ANNOTATION: &str = "k8s.netris.ai/l4lb";
pub const IGNORE_VALUE: &str = "ignore";

/// Health check timeout stamped on generated L4LBs, in milliseconds.
const GENERATED_CHECK_TIMEOUT: u32 = 2000;

/// Where generated L4LBs land on the controller.
pub struct Placement {
    pub tenant: String,
    pub site: String,
}

/// Builds the L4LB set the cluster's LoadBalancer services call for: one
/// L4LB per service port, named `<service>-<namespace>-<uid>-<proto>-<port>`,
/// backed by the node ports of the hosts running the selected pods.
///
/// Services without a node port, without selected pods, or with the ignore
/// annotation produce nothing.
pub fn generate_from_services(
    services: &[Service],
    pods: &[Pod],
    placement: &Placement,
) -> Vec<L4LB> {
    let mut generated = Vec::new();

    for service in services {
        let spec = match &service.spec {
            Some(spec) => spec,
            None => continue,
        };
        if spec.type_.as_deref() != Some("LoadBalancer") {
            continue;
        }
        if service.annotations().get(IGNORE_ANNOTATION).map(String::as_str) == Some(IGNORE_VALUE) {
            continue;
        }

        let (name, namespace, uid) = match (
            service.metadata.name.as_deref(),
            service.metadata.namespace.as_deref(),
            service.metadata.uid.as_deref(),
        ) {
            (Some(name), Some(namespace), Some(uid)) => (name, namespace, uid),
            _ => continue,
        };

        let host_ips = selected_host_ips(spec.selector.as_ref(), pods);
        let ports = spec.ports.as_deref().unwrap_or_default();
        if host_ips.is_empty() || ports.is_empty() {
            continue;
        }

        let ingress_ips = service
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(|ingress| {
                ingress
                    .iter()
                    .filter_map(|entry| entry.ip.clone())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        for port in ports {
            let node_port = match port.node_port {
                Some(node_port) if node_port > 0 => node_port as u16,
                _ => continue,
            };
            let protocol = match port.protocol.as_deref() {
                Some("UDP") => L4LBProtocol::Udp,
                _ => L4LBProtocol::Tcp,
            };
            let lb_name =
                format!("{name}-{namespace}-{uid}-{}-{}", protocol.as_str(), port.port)
                    .to_lowercase();

            let backends = host_ips
                .iter()
                .map(|host_ip| L4LBBackend(format!("{host_ip}:{node_port}")))
                .collect();

            let mut lb = L4LB::new(
                &lb_name,
                L4LBSpec {
                    state: Some(L4LBState::Active),
                    check: L4LBCheck {
                        type_: Some(CheckType::Tcp),
                        timeout: Some(GENERATED_CHECK_TIMEOUT),
                        request_path: None,
                    },
                    owner_tenant: placement.tenant.clone(),
                    site: placement.site.clone(),
                    protocol: Some(protocol),
                    frontend: L4LBFrontend {
                        port: port.port as u16,
                        ip: spec.load_balancer_ip.clone(),
                        subnet: None,
                    },
                    backend: backends,
                },
            );

            lb.metadata.namespace = Some(namespace.to_owned());
            lb.set_service_name(name);
            lb.set_service_namespace(namespace);
            lb.set_service_uid(uid);
            lb.set_service_ingress_ips(&ingress_ips);

            generated.push(lb);
        }
    }

    generated
}

/// Host IPs of the pods any of the service's selector pairs matches.
fn selected_host_ips(
    selector: Option<&BTreeMap<String, String>>,
    pods: &[Pod],
) -> BTreeSet<String> {
    let selector = match selector {
        Some(selector) if !selector.is_empty() => selector,
        _ => return BTreeSet::new(),
    };

    pods.iter()
        .filter(|pod| {
            selector
                .iter()
                .any(|(key, value)| pod.labels().get(key) == Some(value))
        })
        .filter_map(|pod| pod.status.as_ref().and_then(|status| status.host_ip.clone()))
        .collect()
}

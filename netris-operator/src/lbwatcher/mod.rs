use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
    runtime::events::{Event, EventType, Recorder, Reporter},
    Api, Resource,
};
use log::{debug, warn};
use netris_operator_core::{
    kubernetes::operations::{apply_resource, create_resource, delete_resource},
    resources::{crd::v1alpha1::l4lb::L4LB, STATUS_FAILURE},
    FIELD_MANAGER,
};
use serde_json::json;
use tokio::time::interval;

use crate::controller::context::ReconcilerContext;

use self::{
    diff::{compare, LoadBalancerDiff},
    generate::{generate_from_services, Placement},
};

pub mod diff;
pub mod generate;

const WATCH_INTERVAL_SECS: u64 = 10;

/// Makes LoadBalancer services appear as L4LB resources and reflects the
/// provisioned frontends back onto the services. A plain polling loop; the
/// generated L4LBs are reconciled onto the controller by their own
/// controllers like hand-written ones.
pub async fn watch_loop(context: Arc<ReconcilerContext>) {
    let mut ticker = interval(Duration::from_secs(WATCH_INTERVAL_SECS));

    loop {
        ticker.tick().await;

        if let Err(error) = process(&context).await {
            warn!("LB watcher pass failed: {error:#}");
        }
    }
}

async fn process(context: &ReconcilerContext) -> anyhow::Result<()> {
    debug!("Generating load balancers from the cluster services...");

    let placement = default_placement(context).await?;

    let services = context
        .all_api::<Service>()
        .list(&ListParams::default())
        .await
        .context("Couldn't list services!")?
        .items;
    let pods = context
        .all_api::<Pod>()
        .list(&ListParams::default())
        .await
        .context("Couldn't list pods!")?
        .items;
    let l4lbs = context
        .all_api::<L4LB>()
        .list(&ListParams::default())
        .await
        .context("Couldn't list L4LB resources!")?
        .items;

    let desired = generate_from_services(&services, &pods, &placement);
    let owned: Vec<L4LB> = l4lbs.into_iter().filter(L4LB::owned_by_service).collect();

    // service UID → (namespace, name), for status writeback and events
    let targets: BTreeMap<String, (String, String)> = desired
        .iter()
        .filter_map(|lb| {
            Some((
                lb.service_uid()?.to_owned(),
                (
                    lb.service_namespace()?.to_owned(),
                    lb.service_name()?.to_owned(),
                ),
            ))
        })
        .collect();

    // frontends the controller already picked for each service's main L4LB
    let mut auto_ips: BTreeMap<String, String> = BTreeMap::new();
    for lb in &owned {
        if lb.ip_role() != Some("main") {
            continue;
        }
        if let (Some(uid), Some(ip)) = (
            lb.service_uid(),
            lb.status
                .as_ref()
                .and_then(|status| status.ip.clone())
                .filter(|ip| !ip.is_empty()),
        ) {
            auto_ips.insert(uid.to_owned(), ip);
        }
    }

    let diff = compare(&owned, desired);

    apply_diff(context, diff, &auto_ips, &targets).await;
    report_failures(context, &owned).await;

    Ok(())
}

/// Tenant and site generated L4LBs are placed into: the configured defaults,
/// falling back to the controller's built-in tenant and site.
async fn default_placement(context: &ReconcilerContext) -> anyhow::Result<Placement> {
    let tenant = match &context.config.l4lb_tenant {
        Some(tenant) => tenant.clone(),
        None => context
            .storage
            .tenants
            .find(|tenant| tenant.id == 1)
            .await
            .map(|tenant| tenant.name)
            .ok_or_else(|| anyhow!("Default tenant not found"))?,
    };
    let site = match &context.config.l4lb_site {
        Some(site) => site.clone(),
        None => context
            .storage
            .sites
            .find(|site| site.id == 1)
            .await
            .map(|site| site.name)
            .ok_or_else(|| anyhow!("Default site not found"))?,
    };

    Ok(Placement { tenant, site })
}

/// Applies the computed changes. Each failure is logged and the rest of the
/// pass continues; the next tick retries whatever didn't stick.
async fn apply_diff(
    context: &ReconcilerContext,
    diff: LoadBalancerDiff,
    auto_ips: &BTreeMap<String, String>,
    targets: &BTreeMap<String, (String, String)>,
) {
    for lb in &diff.delete {
        if let (Some(name), Some(namespace)) =
            (lb.metadata.name.as_deref(), lb.metadata.namespace.as_deref())
        {
            if let Err(error) =
                delete_resource::<L4LB>(&context.client, name, namespace, &DeleteParams::default())
                    .await
            {
                warn!("Couldn't delete generated L4LB '{name}': {error:#}");
            }
        }
    }

    for group in group_by_service(diff.update) {
        sync_group(context, group, auto_ips, false).await;
    }
    for group in group_by_service(diff.create) {
        sync_group(context, group, auto_ips, true).await;
    }

    for (uid, serving) in &diff.ingress {
        if let Some((namespace, name)) = targets.get(uid) {
            if let Err(error) = assign_ingress(context, namespace, name, serving).await {
                warn!("Couldn't update the ingress of service '{name}': {error:#}");
            }
        }
    }
}

fn group_by_service(lbs: Vec<L4LB>) -> Vec<Vec<L4LB>> {
    let mut groups: BTreeMap<String, Vec<L4LB>> = BTreeMap::new();

    for lb in lbs {
        let uid = lb.service_uid().unwrap_or_default().to_owned();
        groups.entry(uid).or_default().push(lb);
    }

    groups.into_values().collect()
}

/// Writes one service's L4LBs, assigning frontend roles as it goes: an
/// explicit frontend is `standard`, the first automatic one is `main`, and
/// once the controller has picked the main's address the rest become
/// `child`ren of it. Until that address is known the siblings are deferred
/// to a later tick, so the whole group converges on a single frontend.
async fn sync_group(
    context: &ReconcilerContext,
    group: Vec<L4LB>,
    auto_ips: &BTreeMap<String, String>,
    create: bool,
) {
    for mut lb in group {
        let mut main_pending = false;

        if lb.spec.frontend.ip.is_none() {
            let auto_ip = lb.service_uid().and_then(|uid| auto_ips.get(uid));
            match auto_ip {
                Some(ip) => {
                    lb.spec.frontend.ip = Some(ip.clone());
                    lb.set_ip_role("child");
                }
                None => {
                    lb.set_ip_role("main");
                    main_pending = true;
                }
            }
        } else if lb.ip_role() != Some("child") {
            lb.set_ip_role("standard");
        }

        let name = lb.metadata.name.clone().unwrap_or_default();
        let result = if create {
            create_resource(&context.client, &lb, &PostParams::default())
                .await
                .map(drop)
        } else {
            apply_resource(&context.client, &lb, &PatchParams::apply(FIELD_MANAGER).force())
                .await
                .map(drop)
        };

        if let Err(error) = result {
            warn!("Couldn't write generated L4LB '{name}': {error:#}");
        }

        if main_pending {
            break;
        }
    }
}

/// Patches the provisioned frontends into the service's LoadBalancer status.
async fn assign_ingress(
    context: &ReconcilerContext,
    namespace: &str,
    name: &str,
    ips: &BTreeSet<String>,
) -> anyhow::Result<()> {
    let ingress: Vec<_> = ips.iter().map(|ip| json!({ "ip": ip })).collect();
    let service_api: Api<Service> = Api::namespaced(context.client.clone(), namespace);

    service_api
        .patch_status(
            name,
            &PatchParams::default(),
            &Patch::Merge(&json!({"status": {"loadBalancer": {"ingress": ingress}}})),
        )
        .await
        .context(format!("Unable to patch the status of service '{name}'!"))?;

    Ok(())
}

/// Surfaces failed L4LBs as warning Events on the services they were
/// generated from, so `kubectl describe service` tells the story.
async fn report_failures(context: &ReconcilerContext, owned: &[L4LB]) {
    for lb in owned {
        let failed = lb
            .status
            .as_ref()
            .and_then(|status| status.status.as_deref())
            .map(|status| status == STATUS_FAILURE)
            .unwrap_or(false);
        if !failed {
            continue;
        }

        let (namespace, name) = match (lb.service_namespace(), lb.service_name()) {
            (Some(namespace), Some(name)) => (namespace, name),
            _ => continue,
        };
        let note = lb
            .status
            .as_ref()
            .and_then(|status| status.message.clone())
            .unwrap_or_default();

        let service_api: Api<Service> = Api::namespaced(context.client.clone(), namespace);
        let service = match service_api.get_opt(name).await {
            Ok(Some(service)) => service,
            Ok(None) => continue,
            Err(error) => {
                warn!("Couldn't fetch service '{name}' for an event: {error:#?}");
                continue;
            }
        };

        let recorder = Recorder::new(
            context.client.clone(),
            Reporter {
                controller: FIELD_MANAGER.to_owned(),
                instance: None,
            },
            service.object_ref(&()),
        );
        let event = Event {
            type_: EventType::Warning,
            reason: STATUS_FAILURE.to_owned(),
            note: Some(note),
            action: "Synchronize".to_owned(),
            secondary: None,
        };

        if let Err(error) = recorder.publish(event).await {
            warn!("Couldn't publish an event for service '{name}': {error:#?}");
        }
    }
}

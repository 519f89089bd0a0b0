use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use ipnet::IpNet;
use log::{debug, warn};
use netris_operator_api::{
    allocations::Allocation, bgps::Bgp, inventory::HwItem, l4lbs::LoadBalancer, links::Link,
    nats::Nat, nos::Nos, ports::Port, profiles::Profile, server_clusters::ServerCluster,
    sites::Site, subnets::Subnet, templates::ClusterTemplate, tenants::Tenant, vnets::VNet,
    vpcs::Vpc, ApiError, Client,
};
use tokio::sync::RwLock;
use tokio::time::interval;

const REFRESH_INTERVAL_SECS: u64 = 10;

/// One remote collection, replaced wholesale on every refresh. Lookups are
/// linear scans over a clone-on-read snapshot.
pub struct Cache<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Clone> Cache<T> {
    fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn replace(&self, items: Vec<T>) {
        *self.items.write().await = items;
    }

    pub async fn all(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.items
            .read()
            .await
            .iter()
            .find(|item| predicate(item))
            .cloned()
    }

    /// Lookup that refreshes the collection once on a miss; the periodic
    /// refresher may simply not have seen a brand-new object yet.
    pub async fn find_refreshed<P, F, Fut>(&self, predicate: P, refresh: F) -> Option<T>
    where
        P: Fn(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        if let Some(item) = self.find(&predicate).await {
            return Some(item);
        }

        match refresh().await {
            Ok(items) => self.replace(items).await,
            Err(error) => warn!("Couldn't refresh a cache on lookup: {error}"),
        }

        self.find(&predicate).await
    }
}

async fn refresh_into<T: Clone>(
    cache: &Cache<T>,
    listing: impl Future<Output = Result<Vec<T>, ApiError>>,
) -> Result<(), ApiError> {
    cache.replace(listing.await?).await;
    Ok(())
}

/// Local mirror of every controller collection the reconcilers resolve names
/// and IDs against.
pub struct Storage {
    pub sites: Cache<Site>,
    pub tenants: Cache<Tenant>,
    pub vnets: Cache<VNet>,
    pub subnets: Cache<Subnet>,
    pub allocations: Cache<Allocation>,
    pub ports: Cache<Port>,
    pub bgps: Cache<Bgp>,
    pub l4lbs: Cache<LoadBalancer>,
    pub nats: Cache<Nat>,
    pub inventory: Cache<HwItem>,
    pub links: Cache<Link>,
    pub vpcs: Cache<Vpc>,
    pub server_clusters: Cache<ServerCluster>,
    pub cluster_templates: Cache<ClusterTemplate>,
    pub profiles: Cache<Profile>,
    pub nos: Cache<Nos>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            sites: Cache::new(),
            tenants: Cache::new(),
            vnets: Cache::new(),
            subnets: Cache::new(),
            allocations: Cache::new(),
            ports: Cache::new(),
            bgps: Cache::new(),
            l4lbs: Cache::new(),
            nats: Cache::new(),
            inventory: Cache::new(),
            links: Cache::new(),
            vpcs: Cache::new(),
            server_clusters: Cache::new(),
            cluster_templates: Cache::new(),
            profiles: Cache::new(),
            nos: Cache::new(),
        }
    }

    /// Refreshes every collection. One failing endpoint shouldn't starve the
    /// others, so errors are logged per collection instead of aborting.
    pub async fn refresh_all(&self, netris: &Client) {
        debug!("Refreshing the controller caches...");

        if let Err(error) = refresh_into(&self.sites, netris.list_sites()).await {
            warn!("Couldn't refresh the sites cache: {error}");
        }
        if let Err(error) = refresh_into(&self.tenants, netris.list_tenants()).await {
            warn!("Couldn't refresh the tenants cache: {error}");
        }
        if let Err(error) = refresh_into(&self.vnets, netris.list_vnets()).await {
            warn!("Couldn't refresh the vnets cache: {error}");
        }
        if let Err(error) = refresh_into(&self.subnets, netris.list_subnets()).await {
            warn!("Couldn't refresh the subnets cache: {error}");
        }
        if let Err(error) = refresh_into(&self.allocations, netris.list_allocations()).await {
            warn!("Couldn't refresh the allocations cache: {error}");
        }
        if let Err(error) = refresh_into(&self.ports, netris.list_ports()).await {
            warn!("Couldn't refresh the ports cache: {error}");
        }
        if let Err(error) = refresh_into(&self.bgps, netris.list_bgps()).await {
            warn!("Couldn't refresh the bgps cache: {error}");
        }
        if let Err(error) = refresh_into(&self.l4lbs, netris.list_l4lbs()).await {
            warn!("Couldn't refresh the l4lbs cache: {error}");
        }
        if let Err(error) = refresh_into(&self.nats, netris.list_nats()).await {
            warn!("Couldn't refresh the nats cache: {error}");
        }
        if let Err(error) = refresh_into(&self.inventory, netris.list_inventory()).await {
            warn!("Couldn't refresh the inventory cache: {error}");
        }
        if let Err(error) = refresh_into(&self.links, netris.list_links()).await {
            warn!("Couldn't refresh the links cache: {error}");
        }
        if let Err(error) = refresh_into(&self.vpcs, netris.list_vpcs()).await {
            warn!("Couldn't refresh the vpcs cache: {error}");
        }
        if let Err(error) = refresh_into(&self.server_clusters, netris.list_server_clusters()).await
        {
            warn!("Couldn't refresh the server clusters cache: {error}");
        }
        if let Err(error) =
            refresh_into(&self.cluster_templates, netris.list_cluster_templates()).await
        {
            warn!("Couldn't refresh the cluster templates cache: {error}");
        }
        if let Err(error) = refresh_into(&self.profiles, netris.list_profiles()).await {
            warn!("Couldn't refresh the inventory profiles cache: {error}");
        }
        if let Err(error) = refresh_into(&self.nos, netris.list_nos()).await {
            warn!("Couldn't refresh the nos cache: {error}");
        }
    }

    /// Resolves `<port>@<switch>` notation against the port cache.
    pub async fn find_port(&self, qualified: &str) -> Option<Port> {
        self.ports
            .find(|port| port.qualified_name() == qualified)
            .await
    }

    /// The subnet an address falls into, for deriving a tenant or site from
    /// a bare frontend IP.
    pub async fn find_subnet_by_ip(&self, ip: IpAddr) -> Option<Subnet> {
        self.subnets
            .find(|subnet| {
                subnet
                    .prefix
                    .parse::<IpNet>()
                    .map(|prefix| prefix.contains(&ip))
                    .unwrap_or(false)
            })
            .await
    }
}

/// Keeps the caches in sync with the controller until the process exits.
pub async fn refresh_loop(storage: Arc<Storage>, netris: Arc<Client>) {
    let mut ticker = interval(Duration::from_secs(REFRESH_INTERVAL_SECS));

    loop {
        ticker.tick().await;
        storage.refresh_all(&netris).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn cache_lookups_scan_the_latest_snapshot() {
        let cache = Cache::new();
        cache.replace(vec![1u32, 2, 3]).await;

        assert_eq!(cache.find(|n| *n == 2).await, Some(2));
        assert_eq!(cache.find(|n| *n == 7).await, None);

        cache.replace(vec![7]).await;
        assert_eq!(cache.find(|n| *n == 7).await, Some(7));
        assert_eq!(cache.find(|n| *n == 2).await, None);
    }

    #[tokio::test]
    async fn missed_lookups_refresh_once() {
        let cache = Cache::new();
        cache.replace(vec![1u32]).await;

        let refreshed = AtomicBool::new(false);
        let hit = cache
            .find_refreshed(
                |n| *n == 1,
                || {
                    refreshed.store(true, Ordering::Relaxed);
                    async { Ok(Vec::new()) }
                },
            )
            .await;
        assert_eq!(hit, Some(1));
        assert!(!refreshed.load(Ordering::Relaxed));

        let found = cache
            .find_refreshed(|n| *n == 9, || async { Ok(vec![1, 9]) })
            .await;
        assert_eq!(found, Some(9));

        let missing = cache
            .find_refreshed(|n| *n == 4, || async { Err(ApiError::Api("down".into())) })
            .await;
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn subnet_lookup_matches_the_covering_prefix() {
        let storage = Storage::new();
        storage
            .subnets
            .replace(vec![
                Subnet {
                    id: 1,
                    name: "services".into(),
                    prefix: "203.0.113.0/25".into(),
                    ..Default::default()
                },
                Subnet {
                    id: 2,
                    name: "management".into(),
                    prefix: "198.51.100.0/24".into(),
                    ..Default::default()
                },
            ])
            .await;

        let subnet = storage
            .find_subnet_by_ip("198.51.100.40".parse().unwrap())
            .await;
        assert_eq!(subnet.map(|subnet| subnet.id), Some(2));

        let outside = storage.find_subnet_by_ip("203.0.113.200".parse().unwrap()).await;
        assert!(outside.is_none());
    }
}

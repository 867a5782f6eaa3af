//! Test helpers for the group coordinator
//!
//! Builds a coordinator over in-memory collaborators and exposes them so
//! tests can shape cluster state and inspect what the coordinator did.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use proven_groups::{
    ClusterState, GroupInfo, GroupRegistry, NamespaceDescriptor, ServerAddress, TableName,
};
use proven_groups_coordinator::{CoordinatorConfig, GroupCoordinator};
use proven_groups_memory::{
    MemoryClusterState, MemoryGroupRegistry, MemoryNamespaceStore, MemoryTableLockManager,
    RecordingObserver, SimpleLoadBalancer,
};

/// Coordinator plus handles on every collaborator it drives
pub struct TestCluster {
    pub coordinator: Arc<GroupCoordinator>,
    pub registry: MemoryGroupRegistry,
    pub cluster: MemoryClusterState,
    pub balancer: SimpleLoadBalancer,
    pub namespaces: MemoryNamespaceStore,
    pub table_locks: MemoryTableLockManager,
    pub observer: RecordingObserver,
}

impl TestCluster {
    /// Cluster whose default group holds `servers`, all online
    pub async fn new(servers: &[ServerAddress]) -> Self {
        Self::with_config(servers, test_config()).await
    }

    /// Same as [`TestCluster::new`] with a custom coordinator config
    pub async fn with_config(servers: &[ServerAddress], config: CoordinatorConfig) -> Self {
        let registry = MemoryGroupRegistry::with_default_servers(servers.iter().cloned());
        let cluster = MemoryClusterState::new();
        for server in servers {
            cluster.add_online_server(server.clone());
        }

        let balancer = SimpleLoadBalancer::new();
        let namespaces = MemoryNamespaceStore::new();
        namespaces
            .put_namespace(NamespaceDescriptor::new(TableName::DEFAULT_NAMESPACE))
            .await;
        let table_locks = MemoryTableLockManager::new();
        let observer = RecordingObserver::new();

        let coordinator = GroupCoordinator::builder()
            .registry(Arc::new(registry.clone()))
            .cluster(Arc::new(cluster.clone()))
            .placement(Arc::new(balancer.clone()))
            .namespaces(Arc::new(namespaces.clone()))
            .table_locks(Arc::new(table_locks.clone()))
            .observer(Arc::new(observer.clone()))
            .config(config)
            .build()
            .expect("valid coordinator");

        Self {
            coordinator: Arc::new(coordinator),
            registry,
            cluster,
            balancer,
            namespaces,
            table_locks,
            observer,
        }
    }

    /// Moves `servers` out of the default group into a new group `name`
    /// holding `tables`, without going through the coordinator.
    pub async fn put_group(&self, name: &str, servers: &[ServerAddress], tables: &[TableName]) {
        let mut default = self
            .registry
            .get_group(proven_groups::DEFAULT_GROUP)
            .await
            .unwrap()
            .unwrap();
        for server in servers {
            default.remove_server(server);
        }
        self.registry.put_group(default).await;

        self.registry
            .put_group(GroupInfo::with_members(
                name,
                servers.iter().cloned(),
                tables.iter().cloned(),
            ))
            .await;
    }

    /// Creates `count` regions of `table` on each of `servers`
    pub fn spread_regions(&self, table: &TableName, servers: &[ServerAddress], count: usize) {
        for server in servers {
            for i in 0..count {
                let name = format!("{}-{}-{i}", table.qualifier(), server.host());
                self.cluster.add_region(table, &name, Some(server));
            }
        }
    }

    /// Plays the assignment pipeline: assigns every unassigned region to the
    /// first online server of its table's group (default when untracked).
    pub async fn reassign_unassigned(&self) {
        let online = self.cluster.online_servers().await.unwrap();
        for region in self.cluster.unassigned_regions() {
            let group_name = self
                .registry
                .get_group_of_table(region.table())
                .await
                .unwrap()
                .unwrap_or_else(|| proven_groups::DEFAULT_GROUP.to_string());
            let group = self.registry.get_group(&group_name).await.unwrap().unwrap();

            if let Some(server) = group.servers().iter().find(|s| online.contains(*s)) {
                self.cluster.assign(&region, server);
            }
        }
    }

    pub async fn group(&self, name: &str) -> GroupInfo {
        self.registry.get_group(name).await.unwrap().unwrap()
    }
}

/// Coordinator config with drain passes in milliseconds
pub fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        drain_interval: Duration::from_millis(10),
        max_drain_interval: Duration::from_millis(40),
        drain_backoff_multiplier: 2.0,
        ..CoordinatorConfig::default()
    }
}

pub fn server(n: u16) -> ServerAddress {
    ServerAddress::new(format!("rs{n}"), 16020)
}

pub fn table(name: &str) -> TableName {
    TableName::new(TableName::DEFAULT_NAMESPACE, name)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

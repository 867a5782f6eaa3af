//! Group coordinator: owned state and entry points

use std::collections::BTreeSet;
use std::sync::Arc;

use proven_groups::{
    ClusterState, GroupInfo, GroupObserver, GroupRegistry, NamespaceStore, PlacementAlgorithm,
    ServerAddress, TableLockManager, TableName,
};
use tokio::sync::Mutex;

use crate::config::CoordinatorConfig;
use crate::error::{Error, GroupResult};
use crate::transition::TransitionSet;

/// Coordinates group membership changes and group-scoped balancing.
///
/// Two lock domains guard the coordinator:
/// - the membership lock serializes every operation that reads-then-mutates
///   group membership (group add/remove, server moves, table moves);
/// - the placement lock serializes balance runs, and is shared with every
///   other user of the same placement algorithm.
///
/// The two are independent, so a balance run may interleave with a server
/// move. Balancing therefore refuses to run while any region of the group
/// is in transition.
pub struct GroupCoordinator {
    pub(crate) registry: Arc<dyn GroupRegistry>,
    pub(crate) cluster: Arc<dyn ClusterState>,
    pub(crate) placement: Arc<dyn PlacementAlgorithm>,
    pub(crate) namespaces: Arc<dyn NamespaceStore>,
    pub(crate) table_locks: Arc<dyn TableLockManager>,
    pub(crate) observer: Option<Arc<dyn GroupObserver>>,
    pub(crate) membership_lock: Arc<Mutex<()>>,
    pub(crate) placement_lock: Arc<Mutex<()>>,
    pub(crate) servers_in_transition: TransitionSet,
    pub(crate) config: CoordinatorConfig,
}

impl GroupCoordinator {
    /// Start building a coordinator
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    /// Coordinator configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Servers currently being moved between groups
    pub fn servers_in_transition(&self) -> &TransitionSet {
        &self.servers_in_transition
    }

    /// Lock serializing use of the placement algorithm
    pub fn placement_lock(&self) -> Arc<Mutex<()>> {
        self.placement_lock.clone()
    }

    /// Get a group by name
    pub async fn get_group(&self, name: &str) -> GroupResult<Option<GroupInfo>> {
        let _membership = self.membership_lock.lock().await;
        Ok(self.registry.get_group(name).await?)
    }

    /// Get the group a table is pinned to. Untracked tables return `None`.
    pub async fn get_group_of_table(&self, table: &TableName) -> GroupResult<Option<GroupInfo>> {
        let _membership = self.membership_lock.lock().await;

        match self.registry.get_group_of_table(table).await? {
            Some(name) => Ok(self.registry.get_group(&name).await?),
            None => Ok(None),
        }
    }

    /// Get the group a server belongs to
    pub async fn get_group_of_server(
        &self,
        server: &ServerAddress,
    ) -> GroupResult<Option<GroupInfo>> {
        let _membership = self.membership_lock.lock().await;
        Ok(self.registry.get_group_of_server(server).await?)
    }

    /// List every group
    pub async fn list_groups(&self) -> GroupResult<Vec<GroupInfo>> {
        let _membership = self.membership_lock.lock().await;
        Ok(self.registry.list_groups().await?)
    }

    /// Looks up a group that must exist. Callers hold the membership lock.
    pub(crate) async fn get_and_check_group(&self, name: &str) -> GroupResult<GroupInfo> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "The target group cannot be empty".to_string(),
            ));
        }

        self.registry
            .get_group(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Group does not exist: {name}")))
    }

    pub(crate) fn observer(&self) -> Option<&dyn GroupObserver> {
        self.observer.as_deref()
    }
}

/// The tables among `candidates` that belong to `group`.
///
/// The default group also owns every table the registry does not track, so
/// for it each candidate outside its explicit table set is looked up.
pub(crate) async fn member_tables<'a>(
    registry: &dyn GroupRegistry,
    group: &GroupInfo,
    candidates: impl IntoIterator<Item = &'a TableName>,
) -> GroupResult<BTreeSet<TableName>> {
    let mut members = BTreeSet::new();
    for table in candidates.into_iter().collect::<BTreeSet<_>>() {
        let member = group.contains_table(table)
            || (group.is_default() && registry.get_group_of_table(table).await?.is_none());
        if member {
            members.insert(table.clone());
        }
    }
    Ok(members)
}

/// Builder for [`GroupCoordinator`]
#[derive(Default)]
pub struct CoordinatorBuilder {
    registry: Option<Arc<dyn GroupRegistry>>,
    cluster: Option<Arc<dyn ClusterState>>,
    placement: Option<Arc<dyn PlacementAlgorithm>>,
    namespaces: Option<Arc<dyn NamespaceStore>>,
    table_locks: Option<Arc<dyn TableLockManager>>,
    observer: Option<Arc<dyn GroupObserver>>,
    placement_lock: Option<Arc<Mutex<()>>>,
    config: Option<CoordinatorConfig>,
}

impl CoordinatorBuilder {
    /// Set the group registry
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn GroupRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the cluster state view
    #[must_use]
    pub fn cluster(mut self, cluster: Arc<dyn ClusterState>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Set the placement algorithm
    #[must_use]
    pub fn placement(mut self, placement: Arc<dyn PlacementAlgorithm>) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Set the namespace store
    #[must_use]
    pub fn namespaces(mut self, namespaces: Arc<dyn NamespaceStore>) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    /// Set the table lock service
    #[must_use]
    pub fn table_locks(mut self, table_locks: Arc<dyn TableLockManager>) -> Self {
        self.table_locks = Some(table_locks);
        self
    }

    /// Set the observer notified around every operation
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn GroupObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Share an existing placement lock instead of creating one
    #[must_use]
    pub fn placement_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.placement_lock = Some(lock);
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the coordinator
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a required collaborator is missing or the
    /// configuration is invalid.
    pub fn build(self) -> GroupResult<GroupCoordinator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(GroupCoordinator {
            registry: self.registry.ok_or_else(|| missing("registry"))?,
            cluster: self.cluster.ok_or_else(|| missing("cluster"))?,
            placement: self.placement.ok_or_else(|| missing("placement"))?,
            namespaces: self.namespaces.ok_or_else(|| missing("namespaces"))?,
            table_locks: self.table_locks.ok_or_else(|| missing("table_locks"))?,
            observer: self.observer,
            membership_lock: Arc::new(Mutex::new(())),
            placement_lock: self
                .placement_lock
                .unwrap_or_else(|| Arc::new(Mutex::new(()))),
            servers_in_transition: TransitionSet::new(),
            config,
        })
    }
}

fn missing(what: &str) -> Error {
    Error::InvalidArgument(format!("{what} is required"))
}

//! In-memory group registry

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use proven_groups::{
    CollaboratorError, CollaboratorResult, DEFAULT_GROUP, GroupInfo, GroupRegistry, ServerAddress,
    TableName,
};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory group registry. The default group always exists.
#[derive(Clone, Debug)]
pub struct MemoryGroupRegistry {
    groups: Arc<RwLock<BTreeMap<String, GroupInfo>>>,
}

impl MemoryGroupRegistry {
    /// Creates a registry holding only an empty default group.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_servers(std::iter::empty())
    }

    /// Creates a registry whose default group holds `servers`.
    pub fn with_default_servers(servers: impl IntoIterator<Item = ServerAddress>) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            DEFAULT_GROUP.to_string(),
            GroupInfo::with_members(DEFAULT_GROUP, servers, std::iter::empty()),
        );

        Self {
            groups: Arc::new(RwLock::new(groups)),
        }
    }

    /// Inserts or replaces a group definition, bypassing every check.
    pub async fn put_group(&self, group: GroupInfo) {
        self.groups
            .write()
            .await
            .insert(group.name().to_string(), group);
    }
}

impl Default for MemoryGroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupRegistry for MemoryGroupRegistry {
    async fn get_group(&self, name: &str) -> CollaboratorResult<Option<GroupInfo>> {
        Ok(self.groups.read().await.get(name).cloned())
    }

    async fn get_group_of_server(
        &self,
        server: &ServerAddress,
    ) -> CollaboratorResult<Option<GroupInfo>> {
        let groups = self.groups.read().await;

        Ok(groups
            .values()
            .find(|group| group.contains_server(server))
            .cloned())
    }

    async fn get_group_of_table(&self, table: &TableName) -> CollaboratorResult<Option<String>> {
        let groups = self.groups.read().await;

        Ok(groups
            .values()
            .find(|group| group.contains_table(table))
            .map(|group| group.name().to_string()))
    }

    async fn list_groups(&self) -> CollaboratorResult<Vec<GroupInfo>> {
        Ok(self.groups.read().await.values().cloned().collect())
    }

    async fn add_group(&self, group: GroupInfo) -> CollaboratorResult<()> {
        let mut groups = self.groups.write().await;

        if groups.contains_key(group.name()) {
            return Err(CollaboratorError::Rejected(format!(
                "group {} already exists",
                group.name()
            )));
        }

        debug!("Adding group {}", group.name());
        groups.insert(group.name().to_string(), group);

        Ok(())
    }

    async fn remove_group(&self, name: &str) -> CollaboratorResult<()> {
        if name == DEFAULT_GROUP {
            return Err(CollaboratorError::Rejected(
                "the default group cannot be removed".to_string(),
            ));
        }

        let mut groups = self.groups.write().await;
        if groups.remove(name).is_none() {
            return Err(CollaboratorError::Rejected(format!(
                "group {name} does not exist"
            )));
        }

        debug!("Removed group {name}");
        Ok(())
    }

    async fn move_servers(
        &self,
        servers: &BTreeSet<ServerAddress>,
        source_group: &str,
        target_group: &str,
    ) -> CollaboratorResult<BTreeSet<ServerAddress>> {
        let mut groups = self.groups.write().await;

        if !groups.contains_key(target_group) {
            return Err(CollaboratorError::Rejected(format!(
                "group {target_group} does not exist"
            )));
        }

        let source = groups.get_mut(source_group).ok_or_else(|| {
            CollaboratorError::Rejected(format!("group {source_group} does not exist"))
        })?;

        let moved: BTreeSet<ServerAddress> = servers
            .iter()
            .filter(|server| source.remove_server(server))
            .cloned()
            .collect();

        if let Some(target) = groups.get_mut(target_group) {
            for server in &moved {
                target.add_server(server.clone());
            }
        }

        debug!(
            "Moved {} server(s) from {source_group} to {target_group}",
            moved.len()
        );

        Ok(moved)
    }

    async fn move_tables(
        &self,
        tables: &BTreeSet<TableName>,
        target_group: Option<&str>,
    ) -> CollaboratorResult<()> {
        let mut groups = self.groups.write().await;

        if let Some(target) = target_group
            && !groups.contains_key(target)
        {
            return Err(CollaboratorError::Rejected(format!(
                "group {target} does not exist"
            )));
        }

        for group in groups.values_mut() {
            for table in tables {
                group.remove_table(table);
            }
        }

        if let Some(target) = target_group.and_then(|target| groups.get_mut(target)) {
            for table in tables {
                target.add_table(table.clone());
            }
        }

        Ok(())
    }
}

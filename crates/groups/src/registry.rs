use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::group::GroupInfo;
use crate::types::{ServerAddress, TableName};

/// Store of group definitions.
///
/// The registry is a single instance; callers serialize mutations through
/// the coordinator's membership lock.
#[async_trait]
pub trait GroupRegistry: Send + Sync + 'static {
    /// Gets a group by name.
    async fn get_group(&self, name: &str) -> CollaboratorResult<Option<GroupInfo>>;

    /// Gets the group a server belongs to.
    async fn get_group_of_server(
        &self,
        server: &ServerAddress,
    ) -> CollaboratorResult<Option<GroupInfo>>;

    /// Gets the name of the group a table is pinned to. Untracked tables
    /// return `None`.
    async fn get_group_of_table(&self, table: &TableName) -> CollaboratorResult<Option<String>>;

    /// Lists every group, including the default group.
    async fn list_groups(&self) -> CollaboratorResult<Vec<GroupInfo>>;

    /// Adds a new group.
    async fn add_group(&self, group: GroupInfo) -> CollaboratorResult<()>;

    /// Removes a group.
    async fn remove_group(&self, name: &str) -> CollaboratorResult<()>;

    /// Moves servers from one group to another, returning the servers that
    /// were actually moved.
    async fn move_servers(
        &self,
        servers: &BTreeSet<ServerAddress>,
        source_group: &str,
        target_group: &str,
    ) -> CollaboratorResult<BTreeSet<ServerAddress>>;

    /// Pins tables to a group; `None` untracks them.
    async fn move_tables(
        &self,
        tables: &BTreeSet<TableName>,
        target_group: Option<&str>,
    ) -> CollaboratorResult<()>;
}

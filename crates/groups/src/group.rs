//! Server group definition.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{ServerAddress, TableName};

/// Name of the reserved group that always exists and holds every server and
/// table not explicitly placed elsewhere.
pub const DEFAULT_GROUP: &str = "default";

/// A named partition of servers and the tables restricted to run on them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    name: String,
    servers: BTreeSet<ServerAddress>,
    tables: BTreeSet<TableName>,
}

impl GroupInfo {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            servers: BTreeSet::new(),
            tables: BTreeSet::new(),
        }
    }

    /// Creates a group with the given members.
    pub fn with_members(
        name: impl Into<String>,
        servers: impl IntoIterator<Item = ServerAddress>,
        tables: impl IntoIterator<Item = TableName>,
    ) -> Self {
        Self {
            name: name.into(),
            servers: servers.into_iter().collect(),
            tables: tables.into_iter().collect(),
        }
    }

    /// The group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the reserved default group.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_GROUP
    }

    /// Member servers.
    #[must_use]
    pub const fn servers(&self) -> &BTreeSet<ServerAddress> {
        &self.servers
    }

    /// Tables pinned to this group.
    #[must_use]
    pub const fn tables(&self) -> &BTreeSet<TableName> {
        &self.tables
    }

    /// Whether `server` is a member.
    #[must_use]
    pub fn contains_server(&self, server: &ServerAddress) -> bool {
        self.servers.contains(server)
    }

    /// Whether `table` is pinned to this group.
    #[must_use]
    pub fn contains_table(&self, table: &TableName) -> bool {
        self.tables.contains(table)
    }

    /// Adds a server. Returns false if it was already a member.
    pub fn add_server(&mut self, server: ServerAddress) -> bool {
        self.servers.insert(server)
    }

    /// Removes a server. Returns false if it was not a member.
    pub fn remove_server(&mut self, server: &ServerAddress) -> bool {
        self.servers.remove(server)
    }

    /// Adds a table. Returns false if it was already pinned here.
    pub fn add_table(&mut self, table: TableName) -> bool {
        self.tables.insert(table)
    }

    /// Removes a table. Returns false if it was not pinned here.
    pub fn remove_table(&mut self, table: &TableName) -> bool {
        self.tables.remove(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_mutation() {
        let mut group = GroupInfo::new("analytics");
        let server = ServerAddress::new("rs1", 16020);
        let table = TableName::new("default", "events");

        assert!(group.add_server(server.clone()));
        assert!(!group.add_server(server.clone()));
        assert!(group.add_table(table.clone()));
        assert!(group.contains_server(&server));
        assert!(group.contains_table(&table));

        assert!(group.remove_server(&server));
        assert!(!group.remove_server(&server));
        assert!(group.remove_table(&table));
        assert!(group.servers().is_empty());
        assert!(group.tables().is_empty());
        assert!(!group.is_default());
        assert!(GroupInfo::new(DEFAULT_GROUP).is_default());
    }
}

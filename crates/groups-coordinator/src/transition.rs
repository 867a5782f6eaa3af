//! Servers currently being moved between groups

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use proven_groups::ServerAddress;

use crate::error::{Error, GroupResult};

/// Servers mid-migration, mapped to the group they are moving to.
///
/// Lives outside the membership lock so overlapping moves fail fast instead
/// of racing.
#[derive(Clone, Debug, Default)]
pub struct TransitionSet {
    servers: Arc<DashMap<ServerAddress, String>>,
}

impl TransitionSet {
    /// Create an empty transition set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every server as moving to `target_group`.
    ///
    /// Either all servers are recorded or none are. The entries are removed
    /// when the returned guard is dropped.
    pub fn reserve(
        &self,
        servers: &BTreeSet<ServerAddress>,
        target_group: &str,
    ) -> GroupResult<TransitionGuard> {
        let mut guard = TransitionGuard {
            set: self.clone(),
            servers: Vec::with_capacity(servers.len()),
        };

        for server in servers {
            match self.servers.entry(server.clone()) {
                Entry::Occupied(entry) => {
                    let moving_to = entry.get().clone();
                    drop(entry);
                    return Err(Error::Conflict(format!(
                        "Server list contains a server that is already being moved: {server} (to {moving_to})"
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(target_group.to_string());
                    guard.servers.push(server.clone());
                }
            }
        }

        Ok(guard)
    }

    /// Target group of a server currently in transition
    pub fn target_of(&self, server: &ServerAddress) -> Option<String> {
        self.servers.get(server).map(|target| target.clone())
    }

    /// Whether a server is currently in transition
    pub fn contains(&self, server: &ServerAddress) -> bool {
        self.servers.contains_key(server)
    }

    /// Number of servers in transition
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether no server is in transition
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// Releases a reservation made by [`TransitionSet::reserve`] on drop.
#[derive(Debug)]
pub struct TransitionGuard {
    set: TransitionSet,
    servers: Vec<ServerAddress>,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        for server in &self.servers {
            self.set.servers.remove(server);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn server(n: u16) -> ServerAddress {
        ServerAddress::new(format!("rs{n}"), 16020)
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let set = TransitionSet::new();
        let guard = set.reserve(&BTreeSet::from([server(1), server(2)]), "b").unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.target_of(&server(1)).as_deref(), Some("b"));

        drop(guard);
        assert!(set.is_empty());
    }

    #[test]
    fn test_overlap_conflicts_and_leaves_no_partial_entries() {
        let set = TransitionSet::new();
        let _first = set.reserve(&BTreeSet::from([server(2)]), "b").unwrap();

        let result = set.reserve(&BTreeSet::from([server(1), server(2), server(3)]), "c");
        assert_matches!(result, Err(Error::Conflict(_)));

        assert_eq!(set.len(), 1);
        assert!(!set.contains(&server(1)));
        assert!(!set.contains(&server(3)));
        assert_eq!(set.target_of(&server(2)).as_deref(), Some("b"));
    }
}

//! In-memory table locks

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use proven_groups::{CollaboratorResult, TableLockGuard, TableLockManager, TableName};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory table lock manager backed by one read-write lock per table.
#[derive(Clone, Debug, Default)]
pub struct MemoryTableLockManager {
    locks: Arc<DashMap<TableName, Arc<RwLock<()>>>>,
}

impl MemoryTableLockManager {
    /// Creates a new instance of `MemoryTableLockManager`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, table: &TableName) -> Arc<RwLock<()>> {
        self.locks.entry(table.clone()).or_default().clone()
    }

    /// Whether someone currently holds the write lock on `table`.
    #[must_use]
    pub fn is_write_locked(&self, table: &TableName) -> bool {
        self.lock_for(table).try_read().is_err()
    }

    /// Acquires a shared lock on `table`, blocking writers until dropped.
    pub async fn read_lock(&self, table: &TableName) -> TableLockGuard {
        Box::new(self.lock_for(table).read_owned().await)
    }
}

#[async_trait]
impl TableLockManager for MemoryTableLockManager {
    async fn write_lock(
        &self,
        table: &TableName,
        purpose: &str,
    ) -> CollaboratorResult<TableLockGuard> {
        let guard = self.lock_for(table).write_owned().await;
        debug!("Acquired write lock on {table}: {purpose}");

        Ok(Box::new(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_lock_released_on_drop() {
        let manager = MemoryTableLockManager::new();
        let table = TableName::new("default", "t1");

        let guard = manager.write_lock(&table, "test").await.unwrap();
        assert!(manager.is_write_locked(&table));

        drop(guard);
        assert!(!manager.is_write_locked(&table));
    }

    #[tokio::test]
    async fn test_locks_are_per_table() {
        let manager = MemoryTableLockManager::new();
        let t1 = TableName::new("default", "t1");
        let t2 = TableName::new("default", "t2");

        let _guard = manager.write_lock(&t1, "test").await.unwrap();
        assert!(!manager.is_write_locked(&t2));
    }
}

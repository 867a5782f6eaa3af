use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::TableName;

/// Anything that holds a table lock until dropped.
pub trait TableLock: Send + Sync {}

impl<T: Send + Sync> TableLock for T {}

/// Scoped table lock; released when dropped.
pub type TableLockGuard = Box<dyn TableLock>;

/// Cluster-wide table lock service.
#[async_trait]
pub trait TableLockManager: Send + Sync + 'static {
    /// Acquires the exclusive write lock on `table`, waiting until it is free.
    ///
    /// # Arguments
    /// * `table`: The table to lock.
    /// * `purpose`: Human readable reason, recorded by the lock service.
    async fn write_lock(&self, table: &TableName, purpose: &str)
    -> CollaboratorResult<TableLockGuard>;
}

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::{ServerAddress, TableName};

/// Hooks fired before and after each administrative group operation.
///
/// Every method defaults to a no-op, so implementations only override the
/// hooks they care about. An error returned from a hook aborts the operation
/// and is surfaced to its caller.
#[async_trait]
pub trait GroupObserver: Send + Sync + 'static {
    /// Called before servers are moved to `target_group`.
    async fn pre_move_servers(
        &self,
        _servers: &BTreeSet<ServerAddress>,
        _target_group: &str,
    ) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called once moved servers have been fully drained.
    async fn post_move_servers(
        &self,
        _servers: &BTreeSet<ServerAddress>,
        _target_group: &str,
    ) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called before tables are pinned to `target_group` (`None` untracks).
    async fn pre_move_tables(
        &self,
        _tables: &BTreeSet<TableName>,
        _target_group: Option<&str>,
    ) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called after the registry has recorded a table move.
    async fn post_move_tables(
        &self,
        _tables: &BTreeSet<TableName>,
        _target_group: Option<&str>,
    ) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called before a group is added.
    async fn pre_add_group(&self, _name: &str) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called after a group is added.
    async fn post_add_group(&self, _name: &str) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called before a group is removed.
    async fn pre_remove_group(&self, _name: &str) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called after a group is removed.
    async fn post_remove_group(&self, _name: &str) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called before a group is balanced.
    async fn pre_balance_group(&self, _name: &str) -> CollaboratorResult<()> {
        Ok(())
    }

    /// Called after a balance run, with whether any placement was applied.
    async fn post_balance_group(&self, _name: &str, _balancer_ran: bool) -> CollaboratorResult<()> {
        Ok(())
    }
}

//! Moving tables between groups

use std::collections::BTreeSet;

use proven_groups::{DEFAULT_GROUP, TableName};
use tracing::{debug, info};

use crate::coordinator::GroupCoordinator;
use crate::error::{Error, GroupResult};

impl GroupCoordinator {
    /// Pin tables to `target_group`, or untrack them with `None`, then
    /// unassign every region of each moved table so the assignment pipeline
    /// places them on servers of their new group.
    ///
    /// An empty set is a no-op. Regions are unassigned in a single pass under
    /// each table's write lock; completion is not tracked.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the target group does not exist
    /// - `InvalidState` if the target group has no servers
    /// - `InvalidArgument` if a table is already in the target group
    /// - `Unavailable` if a collaborator fails
    pub async fn move_tables(
        &self,
        tables: &BTreeSet<TableName>,
        target_group: Option<&str>,
    ) -> GroupResult<()> {
        if tables.is_empty() {
            debug!("move_tables() passed an empty set. Ignoring.");
            return Ok(());
        }

        {
            let _membership = self.membership_lock.lock().await;

            if let Some(observer) = self.observer() {
                observer.pre_move_tables(tables, target_group).await?;
            }

            if let Some(target) = target_group {
                let group = self.registry.get_group(target).await?.ok_or_else(|| {
                    Error::NotFound(format!("Target group does not exist: {target}"))
                })?;

                if group.servers().is_empty() {
                    return Err(Error::InvalidState(format!(
                        "Target group {target} must have at least one server"
                    )));
                }
            }

            for table in tables {
                let source = self.registry.get_group_of_table(table).await?;
                if let Some(source) = source
                    && Some(source.as_str()) == target_group
                {
                    return Err(Error::InvalidArgument(format!(
                        "Source group is the same as target group for table {table}: {source}"
                    )));
                }
            }

            self.registry.move_tables(tables, target_group).await?;
            info!(
                "Moved {} table(s) to {}",
                tables.len(),
                target_group.unwrap_or(DEFAULT_GROUP)
            );

            if let Some(observer) = self.observer() {
                observer.post_move_tables(tables, target_group).await?;
            }
        }

        for table in tables {
            let _lock = self
                .table_locks
                .write_lock(table, "Group: table move")
                .await?;

            let regions = self.cluster.regions_of_table(table).await?;
            debug!("Unassigning {} region(s) of {table}", regions.len());
            for region in &regions {
                self.cluster.unassign(region).await?;
            }
        }

        Ok(())
    }

    /// Place a newly created table in the group its namespace names, or the
    /// default group when the namespace names none.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the namespace or its group does not exist
    /// - any error of [`GroupCoordinator::move_tables`]
    pub async fn prepare_group_for_table(&self, table: &TableName) -> GroupResult<()> {
        let namespace = self
            .namespaces
            .get_namespace(table.namespace())
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Namespace does not exist: {}", table.namespace()))
            })?;
        let group_name = namespace.group().unwrap_or(DEFAULT_GROUP);

        let group = self
            .get_group(group_name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Group {group_name} does not exist")))?;

        if !group.contains_table(table) {
            debug!("Pre-moving table {table} to group {group_name}");
            self.move_tables(&BTreeSet::from([table.clone()]), Some(group_name))
                .await?;
        }

        Ok(())
    }

    /// Forget a deleted table's group. Best effort: failures are logged and
    /// dropped.
    pub async fn cleanup_group_for_table(&self, table: &TableName) {
        match self.get_group_of_table(table).await {
            Ok(Some(group)) => {
                debug!("Removing deleted table {table} from group {}", group.name());
                if let Err(e) = self
                    .move_tables(&BTreeSet::from([table.clone()]), None)
                    .await
                {
                    debug!("Failed to perform group cleanup for table {table}: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Failed to perform group cleanup for table {table}: {e}");
            }
        }
    }
}

//! Group-scoped balancing
//!
//! Each table of a group is balanced on its own, over the group's online
//! servers only, so one table's regions never move to even out another's.
//! The default group's tables include every table no group tracks.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use proven_groups::{
    AssignmentSnapshot, GroupInfo, RegionInfo, RegionPlan, ServerAddress, TableName,
};
use tracing::{debug, info};

use crate::coordinator::{GroupCoordinator, member_tables};
use crate::error::{Error, GroupResult};

impl GroupCoordinator {
    /// Balance the regions of a group's tables across the group's servers.
    ///
    /// Returns `true` if any placement change was applied. Returns `false`
    /// without touching anything while a region of the group's tables is in
    /// transition or dead servers are being processed.
    ///
    /// Runs under the placement lock only, so it may interleave with a
    /// membership change.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist
    /// - `Unavailable` if a collaborator fails
    pub async fn balance_group(&self, name: &str) -> GroupResult<bool> {
        let _placement = self.placement_lock.lock().await;

        if let Some(observer) = self.observer() {
            observer.pre_balance_group(name).await?;
        }

        let group = self
            .registry
            .get_group(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Group does not exist: {name}")))?;

        let assignments = self.cluster.region_assignments().await?;
        let transitions = self.cluster.regions_in_transition().await?;
        let tables = member_tables(
            self.registry.as_ref(),
            &group,
            group
                .tables()
                .iter()
                .chain(assignments.keys().map(RegionInfo::table))
                .chain(transitions.values().map(|transition| transition.region.table())),
        )
        .await?;

        let in_transition: Vec<_> = transitions
            .into_values()
            .filter(|transition| tables.contains(transition.region.table()))
            .collect();
        if !in_transition.is_empty() {
            debug!(
                "Not running balancer because {} region(s) in transition: {:?}",
                in_transition.len(),
                in_transition
                    .iter()
                    .map(|transition| transition.region.encoded_name())
                    .collect::<Vec<_>>()
            );
            return Ok(false);
        }

        if self.cluster.dead_servers_in_progress().await? {
            debug!("Not running balancer because processing dead regionserver(s)");
            return Ok(false);
        }

        let mut plans = Vec::new();
        for (table, snapshot) in self.table_snapshots(&group, &tables, &assignments).await? {
            if let Some(partial) = self.placement.compute_plan(&snapshot).await? {
                debug!("Partial plan for {table}: {} move(s)", partial.len());
                plans.extend(partial);
            }
        }

        let ran = !plans.is_empty();
        if ran {
            self.apply_plans(name, &plans).await?;
        }

        if let Some(observer) = self.observer() {
            observer.post_balance_group(name, ran).await?;
        }

        Ok(ran)
    }

    /// Per-table assignment of `tables` over the group's online servers.
    /// Servers hosting nothing of a table are listed with no regions; tables
    /// with no assigned region are left out.
    async fn table_snapshots(
        &self,
        group: &GroupInfo,
        tables: &BTreeSet<TableName>,
        assignments: &BTreeMap<RegionInfo, ServerAddress>,
    ) -> GroupResult<Vec<(TableName, AssignmentSnapshot)>> {
        let online = self.cluster.online_servers().await?;
        let servers: BTreeSet<_> = group.servers().intersection(&online).cloned().collect();

        let mut snapshots = Vec::with_capacity(tables.len());
        for table in tables {
            let mut snapshot: AssignmentSnapshot = servers
                .iter()
                .map(|server| (server.clone(), Vec::new()))
                .collect();

            let mut assigned = false;
            for (region, server) in assignments {
                if region.table() != table {
                    continue;
                }
                if let Some(regions) = snapshot.get_mut(server) {
                    regions.push(region.clone());
                    assigned = true;
                }
            }

            if assigned {
                snapshots.push((table.clone(), snapshot));
            }
        }

        Ok(snapshots)
    }

    async fn apply_plans(&self, group: &str, plans: &[RegionPlan]) -> GroupResult<()> {
        let start = Instant::now();
        info!("Group balance {group} starting with plan count: {}", plans.len());

        for plan in plans {
            info!("balance {plan}");
            self.cluster.apply_placement(plan).await?;
        }

        info!(
            "Group balance {group} completed after {}ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

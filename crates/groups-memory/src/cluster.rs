//! In-memory cluster state

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proven_groups::{
    ClusterState, CollaboratorError, CollaboratorResult, RegionInfo, RegionPlan, RegionTransition,
    ServerAddress, TableName, TransitionState,
};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    online: BTreeSet<ServerAddress>,
    dead_servers_in_progress: bool,
    regions: BTreeMap<TableName, Vec<RegionInfo>>,
    assignments: BTreeMap<RegionInfo, ServerAddress>,
    in_transition: BTreeMap<String, RegionTransition>,
    /// Region -> number of unassign calls to ignore before honoring one
    pinned: HashMap<RegionInfo, usize>,
    unassign_calls: Vec<RegionInfo>,
    applied_plans: Vec<RegionPlan>,
    fail_unassign: bool,
}

/// In-memory cluster state.
///
/// `unassign` drops the region's assignment and any transition entry, the
/// way the assignment pipeline eventually would. Regions can be pinned to
/// ignore a number of unassign calls, so a drain has to poll more than once.
#[derive(Clone, Debug, Default)]
pub struct MemoryClusterState {
    state: Arc<Mutex<State>>,
}

impl MemoryClusterState {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a server as online.
    pub fn add_online_server(&self, server: ServerAddress) {
        self.state.lock().online.insert(server);
    }

    /// Marks a server as offline.
    pub fn remove_online_server(&self, server: &ServerAddress) {
        self.state.lock().online.remove(server);
    }

    /// Sets whether dead-server recovery is in progress.
    pub fn set_dead_servers_in_progress(&self, in_progress: bool) {
        self.state.lock().dead_servers_in_progress = in_progress;
    }

    /// Creates a region of `table`, optionally assigned to `server`.
    pub fn add_region(
        &self,
        table: &TableName,
        encoded_name: &str,
        server: Option<&ServerAddress>,
    ) -> RegionInfo {
        let region = RegionInfo::new(table.clone(), encoded_name);
        let mut state = self.state.lock();

        state
            .regions
            .entry(table.clone())
            .or_default()
            .push(region.clone());
        if let Some(server) = server {
            state.assignments.insert(region.clone(), server.clone());
        }

        region
    }

    /// Assigns a region to a server.
    pub fn assign(&self, region: &RegionInfo, server: &ServerAddress) {
        self.state
            .lock()
            .assignments
            .insert(region.clone(), server.clone());
    }

    /// Records a region as in transition on `server`.
    pub fn set_in_transition(
        &self,
        region: &RegionInfo,
        server: &ServerAddress,
        transition: TransitionState,
    ) {
        self.state.lock().in_transition.insert(
            region.encoded_name().to_string(),
            RegionTransition {
                region: region.clone(),
                server: server.clone(),
                state: transition,
            },
        );
    }

    /// Clears a region's transition entry.
    pub fn clear_transition(&self, region: &RegionInfo) {
        self.state.lock().in_transition.remove(region.encoded_name());
    }

    /// Makes the next `ignored_calls` unassign calls for `region` no-ops.
    pub fn pin_region(&self, region: &RegionInfo, ignored_calls: usize) {
        self.state.lock().pinned.insert(region.clone(), ignored_calls);
    }

    /// Makes every unassign call fail with `Unavailable`.
    pub fn set_fail_unassign(&self, fail: bool) {
        self.state.lock().fail_unassign = fail;
    }

    /// Where a region is currently assigned.
    #[must_use]
    pub fn assignment_of(&self, region: &RegionInfo) -> Option<ServerAddress> {
        self.state.lock().assignments.get(region).cloned()
    }

    /// Regions currently assigned to `server`.
    #[must_use]
    pub fn regions_on(&self, server: &ServerAddress) -> Vec<RegionInfo> {
        self.state
            .lock()
            .assignments
            .iter()
            .filter(|(_, assigned)| *assigned == server)
            .map(|(region, _)| region.clone())
            .collect()
    }

    /// Regions with no assignment.
    #[must_use]
    pub fn unassigned_regions(&self) -> Vec<RegionInfo> {
        let state = self.state.lock();

        state
            .regions
            .values()
            .flatten()
            .filter(|region| !state.assignments.contains_key(*region))
            .cloned()
            .collect()
    }

    /// Every unassign call received, in order.
    #[must_use]
    pub fn unassign_calls(&self) -> Vec<RegionInfo> {
        self.state.lock().unassign_calls.clone()
    }

    /// Every placement applied, in order.
    #[must_use]
    pub fn applied_plans(&self) -> Vec<RegionPlan> {
        self.state.lock().applied_plans.clone()
    }
}

#[async_trait]
impl ClusterState for MemoryClusterState {
    async fn online_servers(&self) -> CollaboratorResult<BTreeSet<ServerAddress>> {
        Ok(self.state.lock().online.clone())
    }

    async fn dead_servers_in_progress(&self) -> CollaboratorResult<bool> {
        Ok(self.state.lock().dead_servers_in_progress)
    }

    async fn region_assignments(&self) -> CollaboratorResult<BTreeMap<RegionInfo, ServerAddress>> {
        Ok(self.state.lock().assignments.clone())
    }

    async fn regions_in_transition(
        &self,
    ) -> CollaboratorResult<BTreeMap<String, RegionTransition>> {
        Ok(self.state.lock().in_transition.clone())
    }

    async fn regions_of_table(&self, table: &TableName) -> CollaboratorResult<Vec<RegionInfo>> {
        Ok(self
            .state
            .lock()
            .regions
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn unassign(&self, region: &RegionInfo) -> CollaboratorResult<()> {
        let mut state = self.state.lock();

        if state.fail_unassign {
            return Err(CollaboratorError::Unavailable(format!(
                "cannot unassign {region}"
            )));
        }

        state.unassign_calls.push(region.clone());

        if let Some(remaining) = state.pinned.get_mut(region)
            && *remaining > 0
        {
            *remaining -= 1;
            debug!("Ignoring unassign of pinned region {region}");
            return Ok(());
        }

        state.assignments.remove(region);
        state.in_transition.remove(region.encoded_name());

        Ok(())
    }

    async fn apply_placement(&self, plan: &RegionPlan) -> CollaboratorResult<()> {
        let mut state = self.state.lock();

        state
            .assignments
            .insert(plan.region.clone(), plan.destination.clone());
        state.applied_plans.push(plan.clone());

        Ok(())
    }
}

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::{RegionInfo, RegionPlan, RegionTransition, ServerAddress, TableName};

/// Live view of the cluster: which servers are up and where regions are.
///
/// Every call observes the current state; callers never cache results across
/// decisions.
#[async_trait]
pub trait ClusterState: Send + Sync + 'static {
    /// Servers currently online.
    async fn online_servers(&self) -> CollaboratorResult<BTreeSet<ServerAddress>>;

    /// Whether dead-server recovery is currently running.
    async fn dead_servers_in_progress(&self) -> CollaboratorResult<bool>;

    /// Current region to server assignment.
    async fn region_assignments(&self) -> CollaboratorResult<BTreeMap<RegionInfo, ServerAddress>>;

    /// Regions in transition, keyed by encoded region name.
    async fn regions_in_transition(&self)
    -> CollaboratorResult<BTreeMap<String, RegionTransition>>;

    /// All regions of a table.
    async fn regions_of_table(&self, table: &TableName) -> CollaboratorResult<Vec<RegionInfo>>;

    /// Requests that a region be closed and handed back to the assignment
    /// pipeline. Fire-and-forget and idempotent.
    async fn unassign(&self, region: &RegionInfo) -> CollaboratorResult<()>;

    /// Applies a single placement decision.
    async fn apply_placement(&self, plan: &RegionPlan) -> CollaboratorResult<()>;
}

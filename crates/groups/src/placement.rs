use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::{RegionInfo, RegionPlan, ServerAddress};

/// Current assignment handed to a placement algorithm: every candidate server
/// with the regions it hosts (possibly none).
pub type AssignmentSnapshot = BTreeMap<ServerAddress, Vec<RegionInfo>>;

/// Computes a balanced placement for a snapshot.
#[async_trait]
pub trait PlacementAlgorithm: Send + Sync + 'static {
    /// Computes the moves needed to balance `snapshot`. `None` means no change
    /// is needed.
    async fn compute_plan(
        &self,
        snapshot: &AssignmentSnapshot,
    ) -> CollaboratorResult<Option<Vec<RegionPlan>>>;
}

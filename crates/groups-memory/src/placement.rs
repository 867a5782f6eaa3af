//! Greedy placement algorithm

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proven_groups::{AssignmentSnapshot, CollaboratorResult, PlacementAlgorithm, RegionPlan};
use tracing::debug;

/// Greedy load balancer: repeatedly moves one region from the most loaded
/// server to the least loaded one until region counts differ by at most one.
///
/// Every snapshot it is asked to balance is recorded for inspection.
#[derive(Clone, Debug, Default)]
pub struct SimpleLoadBalancer {
    snapshots: Arc<Mutex<Vec<AssignmentSnapshot>>>,
}

impl SimpleLoadBalancer {
    /// Creates a new balancer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots passed to `compute_plan`, in call order.
    #[must_use]
    pub fn computed_snapshots(&self) -> Vec<AssignmentSnapshot> {
        self.snapshots.lock().clone()
    }
}

#[async_trait]
impl PlacementAlgorithm for SimpleLoadBalancer {
    async fn compute_plan(
        &self,
        snapshot: &AssignmentSnapshot,
    ) -> CollaboratorResult<Option<Vec<RegionPlan>>> {
        self.snapshots.lock().push(snapshot.clone());

        if snapshot.len() < 2 {
            return Ok(None);
        }

        let mut loads: Vec<_> = snapshot
            .iter()
            .map(|(server, regions)| (server.clone(), regions.clone()))
            .collect();
        let mut plans = Vec::new();

        loop {
            // Ties resolve to the first server in address order
            let (most, least) = {
                let mut most = 0;
                let mut least = 0;
                for (index, (_, regions)) in loads.iter().enumerate() {
                    if regions.len() > loads[most].1.len() {
                        most = index;
                    }
                    if regions.len() < loads[least].1.len() {
                        least = index;
                    }
                }
                (most, least)
            };

            if loads[most].1.len() <= loads[least].1.len() + 1 {
                break;
            }

            let Some(region) = loads[most].1.pop() else {
                break;
            };

            plans.push(RegionPlan {
                region: region.clone(),
                source: Some(loads[most].0.clone()),
                destination: loads[least].0.clone(),
            });
            loads[least].1.push(region);
        }

        debug!("Computed {} placement move(s)", plans.len());

        if plans.is_empty() {
            Ok(None)
        } else {
            Ok(Some(plans))
        }
    }
}

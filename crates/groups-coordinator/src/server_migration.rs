//! Moving servers between groups
//!
//! A server move runs in three phases:
//! - **Mutated**: membership has been validated and rewritten in the registry;
//! - **Draining**: regions of tables outside the target group are unassigned
//!   from the moved servers, pass after pass, until none remain;
//! - **Settled**: nothing left to move.
//!
//! Unassignment is an asynchronous transition driven by the assignment
//! pipeline, with no completion signal, so draining polls the cluster view
//! rather than waiting on a callback. Unassign requests are re-issued on every
//! pass until the region is observed gone, which makes a lost request
//! harmless.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use proven_groups::{
    ClusterState, GroupObserver, GroupRegistry, RegionInfo, RegionTransition, ServerAddress,
};
use tokio::sync::{OwnedMutexGuard, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info};

use crate::config::CoordinatorConfig;
use crate::coordinator::{GroupCoordinator, member_tables};
use crate::error::{Error, GroupResult};
use crate::transition::TransitionGuard;

/// Phase of a server move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Membership updated, draining not started
    Mutated,
    /// Unassigning regions from the moved servers
    Draining,
    /// Every moved server is drained
    Settled,
    /// Draining stopped on an error; membership is left as it was changed
    Failed,
}

/// Completion handle for a server move.
///
/// The drain keeps running if the handle is dropped; a move cannot be aborted
/// once membership has changed.
#[derive(Debug)]
pub struct DrainHandle {
    phase: watch::Receiver<MigrationPhase>,
    task: Option<JoinHandle<GroupResult<()>>>,
}

impl DrainHandle {
    fn settled() -> Self {
        let (_, phase) = watch::channel(MigrationPhase::Settled);
        Self { phase, task: None }
    }

    /// Current phase of the move
    pub fn phase(&self) -> MigrationPhase {
        *self.phase.borrow()
    }

    /// Wait until the drain settles or fails
    pub async fn wait(self) -> GroupResult<()> {
        let Some(task) = self.task else {
            return Ok(());
        };

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Server drain task failed: {e}");
                Err(Error::Internal(format!("server drain task failed: {e}")))
            }
        }
    }
}

impl GroupCoordinator {
    /// Move servers into `target_group`, returning once every moved server
    /// hosts no region of a table outside the target group.
    ///
    /// An empty set is a no-op. Membership changes are not rolled back if
    /// draining fails; retrying the whole call is safe.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty target name, a move onto the source
    ///   group, servers from different groups, or offline servers leaving the
    ///   default group
    /// - `NotFound` if the target group does not exist
    /// - `InvalidState` if a server has no group, or the move would leave a
    ///   group with tables but no servers
    /// - `Conflict` if a server is already being moved
    /// - `Unavailable` if a collaborator fails
    pub async fn move_servers(
        &self,
        servers: &BTreeSet<ServerAddress>,
        target_group: &str,
    ) -> GroupResult<()> {
        self.start_move_servers(servers, target_group)
            .await?
            .wait()
            .await
    }

    /// Validate and record a server move, then drain in the background.
    ///
    /// Returns as soon as membership has been updated. The membership lock
    /// and the transition entries stay held until the drain finishes.
    ///
    /// # Errors
    ///
    /// Same as [`GroupCoordinator::move_servers`], minus errors raised while
    /// draining, which are reported by [`DrainHandle::wait`].
    pub async fn start_move_servers(
        &self,
        servers: &BTreeSet<ServerAddress>,
        target_group: &str,
    ) -> GroupResult<DrainHandle> {
        let Some(representative) = servers.iter().next() else {
            debug!("move_servers() passed an empty set. Ignoring.");
            return Ok(DrainHandle::settled());
        };

        // Fail fast instead of queueing behind a move holding the lock
        self.check_not_in_transition(servers)?;

        let membership = self.membership_lock.clone().lock_owned().await;

        if let Some(observer) = self.observer() {
            observer.pre_move_servers(servers, target_group).await?;
        }

        let target = self.get_and_check_group(target_group).await?;

        let source = self
            .registry
            .get_group_of_server(representative)
            .await?
            .ok_or_else(|| {
                Error::InvalidState(format!("Server {representative} does not have a group"))
            })?;

        if source.name() == target.name() {
            return Err(Error::InvalidArgument(format!(
                "Target group is the same as source group: {target_group}"
            )));
        }

        // Only online servers may leave the default group, so unknown
        // addresses never enter a real group.
        if source.is_default() {
            let online = self.cluster.online_servers().await?;
            if let Some(offline) = servers.iter().find(|server| !online.contains(*server)) {
                return Err(Error::InvalidArgument(format!(
                    "Server {offline} is not an online server in default group"
                )));
            }
        }

        for server in servers {
            match self.registry.get_group_of_server(server).await? {
                Some(group) if group.name() == source.name() => {}
                Some(group) => {
                    return Err(Error::InvalidArgument(format!(
                        "Move server request should only come from one source group. \
                         Expecting only {} but {server} belongs to {}",
                        source.name(),
                        group.name()
                    )));
                }
                None => {
                    return Err(Error::InvalidState(format!(
                        "Server {server} does not have a group"
                    )));
                }
            }
        }

        if source.servers().len() <= servers.len() && !source.tables().is_empty() {
            return Err(Error::InvalidState(format!(
                "Cannot leave group {} that contains tables without servers",
                source.name()
            )));
        }

        let transition = self
            .servers_in_transition
            .reserve(servers, target.name())?;

        let moved = self
            .registry
            .move_servers(servers, source.name(), target.name())
            .await?;
        info!(
            "Moved {} server(s) from {} to {}",
            moved.len(),
            source.name(),
            target.name()
        );

        let (phase_tx, phase) = watch::channel(MigrationPhase::Mutated);
        let drain = ServerDrain {
            registry: self.registry.clone(),
            cluster: self.cluster.clone(),
            observer: self.observer.clone(),
            config: self.config.clone(),
            servers: servers.clone(),
            source_group: source.name().to_string(),
            target_group: target.name().to_string(),
            phase: phase_tx,
        };

        let task = tokio::spawn(drain.run(membership, transition).in_current_span());

        Ok(DrainHandle {
            phase,
            task: Some(task),
        })
    }

    fn check_not_in_transition(&self, servers: &BTreeSet<ServerAddress>) -> GroupResult<()> {
        for server in servers {
            if let Some(moving_to) = self.servers_in_transition.target_of(server) {
                return Err(Error::Conflict(format!(
                    "Server list contains a server that is already being moved: {server} (to {moving_to})"
                )));
            }
        }

        Ok(())
    }
}

/// Drain state for one server move, owned by the background task
struct ServerDrain {
    registry: Arc<dyn GroupRegistry>,
    cluster: Arc<dyn ClusterState>,
    observer: Option<Arc<dyn GroupObserver>>,
    config: CoordinatorConfig,
    servers: BTreeSet<ServerAddress>,
    source_group: String,
    target_group: String,
    phase: watch::Sender<MigrationPhase>,
}

impl ServerDrain {
    async fn run(
        self,
        _membership: OwnedMutexGuard<()>,
        _transition: TransitionGuard,
    ) -> GroupResult<()> {
        self.phase.send_replace(MigrationPhase::Draining);

        if let Err(e) = self.drain().await {
            error!(
                "Draining servers moving {} -> {} failed: {e}",
                self.source_group, self.target_group
            );
            self.phase.send_replace(MigrationPhase::Failed);
            return Err(e);
        }

        self.phase.send_replace(MigrationPhase::Settled);

        if let Some(observer) = &self.observer {
            observer
                .post_move_servers(&self.servers, &self.target_group)
                .await?;
        }

        info!(
            "Move server done: {}->{}",
            self.source_group, self.target_group
        );
        Ok(())
    }

    async fn drain(&self) -> GroupResult<()> {
        let mut pending: Vec<ServerAddress> = self.servers.iter().cloned().collect();
        let mut interval = self.config.drain_interval;
        let mut pass = 0_u64;

        loop {
            pass += 1;

            let assignments = self.cluster.region_assignments().await?;
            let in_transition = self.cluster.regions_in_transition().await?;
            // Re-read every pass: tables may have joined the target meanwhile
            let target_tables = match self.registry.get_group(&self.target_group).await? {
                Some(target) => {
                    member_tables(
                        self.registry.as_ref(),
                        &target,
                        assignments.keys().map(RegionInfo::table).chain(
                            in_transition
                                .values()
                                .map(|transition| transition.region.table()),
                        ),
                    )
                    .await?
                }
                None => BTreeSet::new(),
            };

            let mut still_draining = Vec::with_capacity(pending.len());
            for server in pending {
                let regions = self.regions_on_server(&server, &assignments, &in_transition);

                info!(
                    "Unassigning {} regions from server {server} for move to {}",
                    regions.len(),
                    self.target_group
                );

                let mut found = false;
                for region in regions
                    .iter()
                    .filter(|region| !target_tables.contains(region.table()))
                {
                    self.cluster.unassign(region).await?;
                    found = true;
                }

                if found {
                    still_draining.push(server);
                } else {
                    debug!("Server {server} drained after {pass} pass(es)");
                }
            }
            pending = still_draining;

            if pending.is_empty() {
                return Ok(());
            }

            tokio::time::sleep(interval).await;
            interval = self.config.next_drain_interval(interval);
        }
    }

    /// Regions assigned to `server` or in transition on it, with the catalog
    /// table's regions last.
    fn regions_on_server(
        &self,
        server: &ServerAddress,
        assignments: &BTreeMap<RegionInfo, ServerAddress>,
        in_transition: &BTreeMap<String, RegionTransition>,
    ) -> Vec<RegionInfo> {
        let mut regions: BTreeSet<RegionInfo> = assignments
            .iter()
            .filter(|(_, assigned)| *assigned == server)
            .map(|(region, _)| region.clone())
            .collect();
        regions.extend(
            in_transition
                .values()
                .filter(|transition| transition.server == *server)
                .map(|transition| transition.region.clone()),
        );

        let mut regions: Vec<RegionInfo> = regions.into_iter().collect();
        // Unassigning other regions may write to the catalog, so it goes last
        regions.sort_by_key(|region| *region.table() == self.config.meta_table);
        regions
    }
}

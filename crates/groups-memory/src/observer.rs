//! Observer that records hook invocations

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proven_groups::{
    CollaboratorError, CollaboratorResult, GroupObserver, ServerAddress, TableName,
};

#[derive(Debug, Default)]
struct Inner {
    events: Vec<String>,
    fail_on: Option<String>,
}

/// Observer recording every hook call as `"<hook>:<subject>"`.
///
/// It can be armed to reject one hook, which makes the observed operation
/// fail.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingObserver {
    /// Creates an observer with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named hook (e.g. `"pre_remove_group"`) fail from now on.
    pub fn fail_on(&self, hook: impl Into<String>) {
        self.inner.lock().fail_on = Some(hook.into());
    }

    /// Recorded events, in call order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().events.clone()
    }

    fn record(&self, hook: &str, subject: impl std::fmt::Display) -> CollaboratorResult<()> {
        let mut inner = self.inner.lock();

        if inner.fail_on.as_deref() == Some(hook) {
            return Err(CollaboratorError::Rejected(format!("{hook} refused")));
        }

        inner.events.push(format!("{hook}:{subject}"));
        Ok(())
    }
}

#[async_trait]
impl GroupObserver for RecordingObserver {
    async fn pre_move_servers(
        &self,
        _servers: &BTreeSet<ServerAddress>,
        target_group: &str,
    ) -> CollaboratorResult<()> {
        self.record("pre_move_servers", target_group)
    }

    async fn post_move_servers(
        &self,
        _servers: &BTreeSet<ServerAddress>,
        target_group: &str,
    ) -> CollaboratorResult<()> {
        self.record("post_move_servers", target_group)
    }

    async fn pre_move_tables(
        &self,
        _tables: &BTreeSet<TableName>,
        target_group: Option<&str>,
    ) -> CollaboratorResult<()> {
        self.record("pre_move_tables", target_group.unwrap_or("none"))
    }

    async fn post_move_tables(
        &self,
        _tables: &BTreeSet<TableName>,
        target_group: Option<&str>,
    ) -> CollaboratorResult<()> {
        self.record("post_move_tables", target_group.unwrap_or("none"))
    }

    async fn pre_add_group(&self, name: &str) -> CollaboratorResult<()> {
        self.record("pre_add_group", name)
    }

    async fn post_add_group(&self, name: &str) -> CollaboratorResult<()> {
        self.record("post_add_group", name)
    }

    async fn pre_remove_group(&self, name: &str) -> CollaboratorResult<()> {
        self.record("pre_remove_group", name)
    }

    async fn post_remove_group(&self, name: &str) -> CollaboratorResult<()> {
        self.record("post_remove_group", name)
    }

    async fn pre_balance_group(&self, name: &str) -> CollaboratorResult<()> {
        self.record("pre_balance_group", name)
    }

    async fn post_balance_group(&self, name: &str, balancer_ran: bool) -> CollaboratorResult<()> {
        self.record("post_balance_group", format!("{name}={balancer_ran}"))
    }
}

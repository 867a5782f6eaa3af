//! Coordinator configuration

use std::time::Duration;

use proven_groups::TableName;
use serde::{Deserialize, Serialize};

use crate::error::{Error, GroupResult};

/// Group coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Wait between the first and second drain passes
    pub drain_interval: Duration,

    /// Upper bound for the wait between drain passes
    pub max_drain_interval: Duration,

    /// Growth factor applied to the wait after each pass (1.0 keeps it fixed)
    pub drain_backoff_multiplier: f64,

    /// Catalog table whose regions are unassigned last in every drain pass
    pub meta_table: TableName,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(1),
            max_drain_interval: Duration::from_secs(5),
            drain_backoff_multiplier: 1.5,
            meta_table: TableName::new("system", "meta"),
        }
    }
}

impl CoordinatorConfig {
    /// Checks the configuration for values the drain loop cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the drain interval is zero, the cap is
    /// below the initial interval or the multiplier is below 1.0 or not
    /// finite.
    pub fn validate(&self) -> GroupResult<()> {
        if self.drain_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "drain_interval must be greater than zero".to_string(),
            ));
        }

        if self.max_drain_interval < self.drain_interval {
            return Err(Error::InvalidArgument(format!(
                "max_drain_interval ({:?}) is below drain_interval ({:?})",
                self.max_drain_interval, self.drain_interval
            )));
        }

        if !self.drain_backoff_multiplier.is_finite() || self.drain_backoff_multiplier < 1.0 {
            return Err(Error::InvalidArgument(format!(
                "drain_backoff_multiplier must be a finite value of at least 1.0, got {}",
                self.drain_backoff_multiplier
            )));
        }

        Ok(())
    }

    /// Wait to use after a pass that waited `current`.
    ///
    /// Saturates at `max_drain_interval`, including when the product does not
    /// fit in a `Duration`.
    pub(crate) fn next_drain_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.drain_backoff_multiplier)
            .map_or(self.max_drain_interval, |next| next.min(self.max_drain_interval))
    }
}

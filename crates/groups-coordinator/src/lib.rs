//! Group coordinator: keeps server and table membership of groups
//! consistent and balances regions within a group.
//!
//! The coordinator drives external collaborators defined in `proven-groups`
//! and owns only the locks and the set of servers currently being moved.
//! Membership operations (group add/remove, server and table moves) are
//! serialized by one lock; balance runs are serialized by a second,
//! independent one.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod balancer;
mod command;
mod config;
mod coordinator;
mod error;
mod lifecycle;
mod server_migration;
mod table_migration;
mod transition;

pub use command::{GroupCommand, GroupCommandResponse};
pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorBuilder, GroupCoordinator};
pub use error::{Error, ErrorKind, GroupResult};
pub use server_migration::{DrainHandle, MigrationPhase};
pub use transition::{TransitionGuard, TransitionSet};

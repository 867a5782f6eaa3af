//! Abstract interfaces for server groups: the data model shared by the group
//! coordinator and the collaborators it drives (group registry, cluster state,
//! placement algorithm, namespace store, table locks and observers).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod cluster;
mod error;
mod group;
mod namespace;
mod observer;
mod placement;
mod registry;
mod table_lock;
mod types;

pub use cluster::ClusterState;
pub use error::{CollaboratorError, CollaboratorResult};
pub use group::{DEFAULT_GROUP, GroupInfo};
pub use namespace::{NAMESPACE_GROUP_PROPERTY, NamespaceDescriptor, NamespaceStore};
pub use observer::GroupObserver;
pub use placement::{AssignmentSnapshot, PlacementAlgorithm};
pub use registry::GroupRegistry;
pub use table_lock::{TableLock, TableLockGuard, TableLockManager};
pub use types::{
    ParseError, RegionInfo, RegionPlan, RegionTransition, ServerAddress, TableName,
    TransitionState,
};

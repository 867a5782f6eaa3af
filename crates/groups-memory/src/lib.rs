//! In-memory (single node) implementations of the group collaborators for
//! local development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod cluster;
mod namespace;
mod observer;
mod placement;
mod registry;
mod table_lock;

pub use cluster::MemoryClusterState;
pub use namespace::MemoryNamespaceStore;
pub use observer::RecordingObserver;
pub use placement::SimpleLoadBalancer;
pub use registry::MemoryGroupRegistry;
pub use table_lock::MemoryTableLockManager;

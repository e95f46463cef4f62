//! Connection definitions, the in-memory store and JSON persistence.

pub mod definition;
pub mod persist;
pub mod store;

pub use definition::{ConnectionDefinition, ConnectionId};
pub use persist::ConnectionsFile;
pub use store::ConnectionStore;

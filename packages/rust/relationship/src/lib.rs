//! Dependency graph between discovered entities.
//!
//! Nodes are keyed by entity name only. Edges are typed
//! ([`RelationshipType::Normal`] or [`RelationshipType::Host`]) and always
//! stored on both endpoints, so parents and children can be read from either
//! side without a scan.

pub mod model;
pub mod service;
pub mod store;

pub use model::{Relationship, RelationshipEntity, RelationshipType};
pub use service::RelationshipService;
pub use store::{MemoryRelationshipStore, RelationshipStore};

//! Entity discovery: sources, the deduplicating collection, and the factory
//! that drives sources to populate one collection.
//!
//! A run is a single batch pass. Every registered [`EntitySource`] is handed
//! the same [`EntityCollection`]; entities with an identity already present
//! are merged into the existing member instead of being appended.

mod collection;
mod factory;
pub mod filesystem;
mod schemas;
pub mod terraform;

use drdocer_shared::Result;

pub use collection::EntityCollection;
pub use factory::{EntityFactory, build_source};
pub use filesystem::FilesystemSource;
pub use terraform::TerraformSource;

/// A pluggable origin of entities (filesystem records, Terraform definitions, ...).
pub trait EntitySource {
    /// Add every entity this source knows about to `collection`.
    ///
    /// Implementations only call [`EntityCollection::add_entity`] and do not
    /// keep the collection after returning. Any error aborts the whole load.
    fn get_entities(&self, collection: &mut EntityCollection) -> Result<()>;

    /// Sources with a higher priority run first.
    fn priority(&self) -> i32;

    /// Human-readable source name for tracing and error reports.
    fn name(&self) -> &str;
}

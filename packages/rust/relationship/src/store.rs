//! Persistence seam for relationship entities.

use std::collections::HashMap;

use drdocer_shared::Result;

use crate::model::RelationshipEntity;

/// Backing store for the relationship graph, keyed by entity name.
pub trait RelationshipStore {
    /// Look up a node. `Ok(None)` means the name has never been stored.
    fn get_entity_by_name(&self, name: &str) -> Result<Option<RelationshipEntity>>;

    /// Insert or replace the node with `entity.name`.
    fn upsert_entity(&mut self, entity: RelationshipEntity) -> Result<()>;

    /// Drop every node.
    fn clear(&mut self) -> Result<()>;
}

/// Process-local store. Nothing survives the run.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelationshipStore {
    entities: HashMap<String, RelationshipEntity>,
}

impl MemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl RelationshipStore for MemoryRelationshipStore {
    fn get_entity_by_name(&self, name: &str) -> Result<Option<RelationshipEntity>> {
        Ok(self.entities.get(name).cloned())
    }

    fn upsert_entity(&mut self, entity: RelationshipEntity) -> Result<()> {
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entities.clear();
        Ok(())
    }
}

impl<S: RelationshipStore + ?Sized> RelationshipStore for Box<S> {
    fn get_entity_by_name(&self, name: &str) -> Result<Option<RelationshipEntity>> {
        (**self).get_entity_by_name(name)
    }

    fn upsert_entity(&mut self, entity: RelationshipEntity) -> Result<()> {
        (**self).upsert_entity(entity)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

use tracing::debug;

use drdocer_metadata::Entity;
use drdocer_shared::{DrDocerError, EntityType, MergePolicy, Result};

/// Insertion-ordered set of entities, unique by `(name, type)`.
///
/// Lookups are linear scans; a run holds hundreds to low thousands of
/// entities.
#[derive(Debug, Clone, Default)]
pub struct EntityCollection {
    entities: Vec<Entity>,
    merge_policy: MergePolicy,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge_policy(merge_policy: MergePolicy) -> Self {
        Self {
            entities: Vec::new(),
            merge_policy,
        }
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    /// Add an entity, merging it into an existing member with the same
    /// identity. New identities keep first-seen order.
    pub fn add_entity(&mut self, entity: Entity) -> Result<()> {
        if entity.name().is_empty() {
            return Err(DrDocerError::invalid_entity(format!(
                "cannot add {} entity with empty name",
                entity.entity_type()
            )));
        }

        let policy = self.merge_policy;
        match self.find_mut(entity.name().as_str(), entity.entity_type()) {
            Some(existing) => {
                debug!(entity = %entity.id(), "merging into existing entity");
                existing.merge_attributes(&entity, policy);
            }
            None => {
                debug!(entity = %entity.id(), "adding entity");
                self.entities.push(entity);
            }
        }
        Ok(())
    }

    pub fn get_entity_by_name_and_type(
        &self,
        name: &str,
        entity_type: &EntityType,
    ) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name().as_str() == name && e.entity_type() == entity_type)
    }

    /// All members in order of first discovery.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn find_mut(&mut self, name: &str, entity_type: &EntityType) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.name().as_str() == name && e.entity_type() == entity_type)
    }
}

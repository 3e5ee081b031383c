//! The attribute-bag entity and its merge rules.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use drdocer_shared::{DrDocerError, EntityId, EntityName, EntityType, MergePolicy, Result};

use crate::attribute::{Attribute, AttributeInstance, AttributeValue, BASELINE_PRIORITY};

/// A discovered real-world object identified by `(name, type)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: EntityName,
    entity_type: EntityType,
    default_priority: i32,
    attributes: BTreeMap<String, AttributeInstance>,
}

impl Entity {
    pub fn new(
        name: impl Into<EntityName>,
        entity_type: impl Into<EntityType>,
        default_priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            default_priority,
            attributes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn default_priority(&self) -> i32 {
        self.default_priority
    }

    pub fn id(&self) -> EntityId {
        EntityId {
            name: self.name.clone(),
            entity_type: self.entity_type.clone(),
        }
    }

    /// Initialise an attribute at the entity's default priority.
    pub fn set_attribute(&mut self, schema: &Arc<Attribute>, value: AttributeValue) -> Result<()> {
        self.set_attribute_with_priority(schema, value, BASELINE_PRIORITY)
    }

    /// Initialise an attribute at an explicit priority. Passing
    /// [`BASELINE_PRIORITY`] falls back to the entity's default priority.
    ///
    /// Each attribute can be set once; later facts must arrive through
    /// [`merge_attributes`](Self::merge_attributes).
    pub fn set_attribute_with_priority(
        &mut self,
        schema: &Arc<Attribute>,
        value: AttributeValue,
        priority: i32,
    ) -> Result<()> {
        if self.attributes.contains_key(schema.name()) {
            return Err(DrDocerError::AlreadySet {
                attribute: schema.name().to_string(),
                entity: self.name.to_string(),
            });
        }

        let mut instance = schema.create_instance();
        instance.set_value(value)?;
        let priority = if priority == BASELINE_PRIORITY {
            self.default_priority
        } else {
            priority
        };
        instance.set_priority(priority);

        self.attributes.insert(schema.name().to_string(), instance);
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInstance> {
        self.attributes.get(name)
    }

    /// All attribute instances, ordered by attribute name.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeInstance> {
        self.attributes.values()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// String value of an attribute, if set and non-empty.
    pub fn string_value(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(|a| a.value().as_str())
            .filter(|s| !s.is_empty())
    }

    /// String items of a list attribute; non-string items are skipped.
    pub fn list_value(&self, name: &str) -> Vec<&str> {
        self.attribute(name)
            .and_then(|a| a.value().as_list())
            .map(|items| items.iter().filter_map(AttributeValue::as_str).collect())
            .unwrap_or_default()
    }

    /// Fold `other`'s facts into `self`.
    ///
    /// Overlapping attributes follow [`AttributeInstance::merge_attribute`].
    /// Attributes only `other` carries are adopted under
    /// [`MergePolicy::Union`] and dropped under [`MergePolicy::Overlapping`].
    pub fn merge_attributes(&mut self, other: &Entity, policy: MergePolicy) {
        for incoming in other.attributes.values() {
            match self.attributes.get_mut(incoming.name()) {
                Some(existing) => existing.merge_attribute(Some(incoming)),
                None if policy == MergePolicy::Union => {
                    trace!(entity = %self.name, attribute = incoming.name(), "adopting attribute");
                    self.attributes
                        .insert(incoming.name().to_string(), incoming.clone());
                }
                None => {}
            }
        }
    }
}

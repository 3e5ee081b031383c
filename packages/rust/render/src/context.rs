//! Data exposed to templates.

use std::collections::BTreeMap;

use serde::Serialize;

use drdocer_metadata::{AttributeValue, Entity};
use drdocer_relationship::{RelationshipService, RelationshipStore, RelationshipType};
use drdocer_shared::{DrDocerError, Result};

/// Render context for one entity.
///
/// Templates see `name`, `type`, `attributes.<name>`, and
/// `parents.<kind>` / `children.<kind>` name lists for each relationship
/// kind (`normal`, `host`).
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub entity_type: &'a str,
    pub attributes: BTreeMap<&'a str, &'a AttributeValue>,
    pub parents: BTreeMap<&'static str, Vec<String>>,
    pub children: BTreeMap<&'static str, Vec<String>>,
}

impl<'a> TemplateContext<'a> {
    /// Collect `entity`'s attributes and its edges from `graph`. An entity the
    /// graph has never seen gets empty edge lists.
    pub fn build<S: RelationshipStore>(
        entity: &'a Entity,
        graph: &RelationshipService<S>,
    ) -> Result<Self> {
        let name = entity.name().as_str();
        let mut parents = BTreeMap::new();
        let mut children = BTreeMap::new();

        for kind in RelationshipType::ALL {
            parents.insert(kind.as_str(), or_empty(graph.get_entity_parents(name, kind))?);
            children.insert(kind.as_str(), or_empty(graph.get_entity_children(name, kind))?);
        }

        Ok(Self {
            name,
            entity_type: entity.entity_type().as_str(),
            attributes: entity
                .attributes()
                .map(|attribute| (attribute.name(), attribute.value()))
                .collect(),
            parents,
            children,
        })
    }
}

fn or_empty(result: Result<Vec<String>>) -> Result<Vec<String>> {
    match result {
        Err(DrDocerError::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

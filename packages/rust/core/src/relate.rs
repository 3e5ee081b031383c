//! Derives relationship edges from entity attributes.
//!
//! `host` becomes a [`RelationshipType::Host`] edge to the named entity and
//! every name in `dependencies` becomes a [`RelationshipType::Normal`] edge.

use tracing::{info, instrument, warn};

use drdocer_discovery::EntityCollection;
use drdocer_metadata::{ATTRIBUTE_DEPENDENCIES, ATTRIBUTE_HOST, Entity};
use drdocer_relationship::{RelationshipService, RelationshipStore, RelationshipType};
use drdocer_shared::Result;

/// Counts from one relate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelateStats {
    pub entities: usize,
    pub edges: usize,
}

/// Reset `graph`, register every entity of `collection`, then add the edges
/// its attributes declare, in collection order.
///
/// Nothing from an earlier pass survives, so a persistent store only ever
/// holds the edges of the latest collection. Self references are skipped with a warning. Targets missing from the
/// collection still get a node so both sides of the edge are queryable.
#[instrument(skip_all, fields(entities = collection.len()))]
pub fn build_relationships<S: RelationshipStore>(
    collection: &EntityCollection,
    graph: &mut RelationshipService<S>,
) -> Result<RelateStats> {
    let mut stats = RelateStats::default();
    graph.clear()?;

    for entity in collection.entities() {
        graph.register_entity(entity.name().as_str())?;
        stats.entities += 1;
    }

    for entity in collection.entities() {
        for (parent, kind) in declared_edges(entity) {
            if parent == entity.name().as_str() {
                warn!(entity = %entity.id(), %kind, "skipping self reference");
                continue;
            }
            graph.add_entity_relationship(entity.name().as_str(), parent, kind)?;
            stats.edges += 1;
        }
    }

    info!(entities = stats.entities, edges = stats.edges, "relationships built");
    Ok(stats)
}

fn declared_edges(entity: &Entity) -> Vec<(&str, RelationshipType)> {
    let mut edges = Vec::new();
    if let Some(host) = entity.string_value(ATTRIBUTE_HOST) {
        edges.push((host, RelationshipType::Host));
    }
    edges.extend(
        entity
            .list_value(ATTRIBUTE_DEPENDENCIES)
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| (name, RelationshipType::Normal)),
    );
    edges
}

#[cfg(test)]
mod tests {
    use drdocer_metadata::AttributeRegistry;
    use drdocer_relationship::MemoryRelationshipStore;
    use drdocer_shared::EntityType;

    use super::*;

    fn collection() -> EntityCollection {
        let registry = AttributeRegistry::builtin().unwrap();
        let host = registry.schema(ATTRIBUTE_HOST).unwrap();
        let deps = registry.schema(ATTRIBUTE_DEPENDENCIES).unwrap();

        let mut collection = EntityCollection::new();
        collection
            .add_entity(Entity::new("web1", EntityType::server(), 0))
            .unwrap();

        let mut shop = Entity::new("shop", EntityType::service(), 0);
        shop.set_attribute(&host, "web1".into()).unwrap();
        shop.set_attribute(&deps, vec!["db1".to_string(), "shop".to_string()].into())
            .unwrap();
        collection.add_entity(shop).unwrap();

        let mut worker = Entity::new("worker", EntityType::service(), 0);
        worker.set_attribute(&host, "web1".into()).unwrap();
        worker
            .set_attribute(&deps, vec!["db1".to_string()].into())
            .unwrap();
        collection.add_entity(worker).unwrap();
        collection
    }

    #[test]
    fn builds_host_and_dependency_edges() {
        let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
        let stats = build_relationships(&collection(), &mut graph).unwrap();
        assert_eq!(stats, RelateStats { entities: 3, edges: 4 });

        assert_eq!(
            graph.get_entity_children("web1", RelationshipType::Host).unwrap(),
            vec!["shop", "worker"]
        );
        assert_eq!(
            graph.get_entity_parents("shop", RelationshipType::Normal).unwrap(),
            vec!["db1"]
        );
        assert_eq!(
            graph.get_entity_children("db1", RelationshipType::Normal).unwrap(),
            vec!["shop", "worker"]
        );
    }

    #[test]
    fn entities_without_edges_are_registered() {
        let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
        build_relationships(&collection(), &mut graph).unwrap();
        assert!(graph
            .get_entity_parents("web1", RelationshipType::Host)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rerun_drops_edges_no_longer_declared() {
        let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
        build_relationships(&collection(), &mut graph).unwrap();

        let mut smaller = EntityCollection::new();
        smaller
            .add_entity(Entity::new("shop", EntityType::service(), 0))
            .unwrap();
        let stats = build_relationships(&smaller, &mut graph).unwrap();
        assert_eq!(stats, RelateStats { entities: 1, edges: 0 });

        assert!(graph
            .get_entity_parents("shop", RelationshipType::Normal)
            .unwrap()
            .is_empty());
        assert!(matches!(
            graph.get_entity_children("db1", RelationshipType::Normal),
            Err(drdocer_shared::DrDocerError::NotFound(_))
        ));
        assert_eq!(graph.store().len(), 1);
    }

    #[test]
    fn rerunning_is_idempotent() {
        let collection = collection();
        let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
        build_relationships(&collection, &mut graph).unwrap();
        build_relationships(&collection, &mut graph).unwrap();
        assert_eq!(
            graph.get_entity_children("db1", RelationshipType::Normal).unwrap(),
            vec!["shop", "worker"]
        );
    }
}

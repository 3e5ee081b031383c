//! Graph operations over a [`RelationshipStore`].

use tracing::{debug, trace};

use drdocer_shared::{DrDocerError, Result};

use crate::model::{Relationship, RelationshipEntity, RelationshipType};
use crate::store::RelationshipStore;

/// Maintains bidirectional dependency edges between named entities.
///
/// Every edge is recorded twice: as a `depends_on` entry on the child and as
/// a `dependents` entry on the parent.
#[derive(Debug, Default)]
pub struct RelationshipService<S> {
    store: S,
}

impl<S: RelationshipStore> RelationshipService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Forget every node and edge.
    pub fn clear(&mut self) -> Result<()> {
        debug!("clearing relationship graph");
        self.store.clear()
    }

    /// The stored node for `name`, or a fresh unsaved node with no edges.
    pub fn get_or_create_entity(&self, name: &str) -> Result<RelationshipEntity> {
        Ok(self
            .store
            .get_entity_by_name(name)?
            .unwrap_or_else(|| RelationshipEntity::new(name)))
    }

    /// Persist a node for `name` if none exists yet.
    pub fn register_entity(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        if self.store.get_entity_by_name(name)?.is_none() {
            trace!(entity = name, "registering relationship entity");
            self.store.upsert_entity(RelationshipEntity::new(name))?;
        }
        Ok(())
    }

    /// Record that `name` depends on `parent_name` through an edge of `kind`.
    ///
    /// The child is written before the parent. If the second write fails the
    /// store holds only the child side of the edge.
    pub fn add_entity_relationship(
        &mut self,
        name: &str,
        parent_name: &str,
        kind: RelationshipType,
    ) -> Result<()> {
        check_name(name)?;
        check_name(parent_name)?;
        if name == parent_name {
            return Err(DrDocerError::invalid_entity(format!(
                "{name} cannot depend on itself"
            )));
        }

        let mut child = self.get_or_create_entity(name)?;
        let mut parent = self.get_or_create_entity(parent_name)?;

        let added = child.add_depends_on(Relationship::new(kind, parent_name));
        parent.add_dependent(Relationship::new(kind, name));

        self.store.upsert_entity(child)?;
        self.store.upsert_entity(parent)?;

        debug!(child = name, parent = parent_name, %kind, added, "recorded relationship");
        Ok(())
    }

    /// Names `name` depends on through edges of `kind`.
    pub fn get_entity_parents(&self, name: &str, kind: RelationshipType) -> Result<Vec<String>> {
        Ok(self.require(name)?.parents(kind))
    }

    /// Names depending on `name` through edges of `kind`.
    pub fn get_entity_children(&self, name: &str, kind: RelationshipType) -> Result<Vec<String>> {
        Ok(self.require(name)?.children(kind))
    }

    fn require(&self, name: &str) -> Result<RelationshipEntity> {
        self.store
            .get_entity_by_name(name)?
            .ok_or_else(|| DrDocerError::NotFound(name.to_string()))
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DrDocerError::invalid_entity(
            "relationship entity name must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRelationshipStore;

    fn service() -> RelationshipService<MemoryRelationshipStore> {
        RelationshipService::new(MemoryRelationshipStore::new())
    }

    #[test]
    fn host_edge_is_symmetric() {
        let mut graph = service();
        graph
            .add_entity_relationship("web1", "host1", RelationshipType::Host)
            .unwrap();

        assert_eq!(
            graph.get_entity_parents("web1", RelationshipType::Host).unwrap(),
            vec!["host1"]
        );
        assert_eq!(
            graph.get_entity_children("host1", RelationshipType::Host).unwrap(),
            vec!["web1"]
        );
        assert!(graph
            .get_entity_parents("web1", RelationshipType::Normal)
            .unwrap()
            .is_empty());
        assert!(graph
            .get_entity_children("web1", RelationshipType::Host)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn edges_accumulate_in_order() {
        let mut graph = service();
        graph
            .add_entity_relationship("api", "db1", RelationshipType::Normal)
            .unwrap();
        graph
            .add_entity_relationship("api", "cache1", RelationshipType::Normal)
            .unwrap();
        graph
            .add_entity_relationship("worker", "db1", RelationshipType::Normal)
            .unwrap();

        assert_eq!(
            graph.get_entity_parents("api", RelationshipType::Normal).unwrap(),
            vec!["db1", "cache1"]
        );
        assert_eq!(
            graph.get_entity_children("db1", RelationshipType::Normal).unwrap(),
            vec!["api", "worker"]
        );
    }

    #[test]
    fn repeated_edge_is_recorded_once() {
        let mut graph = service();
        for _ in 0..3 {
            graph
                .add_entity_relationship("web1", "host1", RelationshipType::Host)
                .unwrap();
        }
        let web1 = graph.get_or_create_entity("web1").unwrap();
        let host1 = graph.get_or_create_entity("host1").unwrap();
        assert_eq!(web1.depends_on.len(), 1);
        assert_eq!(host1.dependents.len(), 1);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let graph = service();
        let err = graph
            .get_entity_parents("ghost", RelationshipType::Normal)
            .unwrap_err();
        assert!(matches!(err, DrDocerError::NotFound(name) if name == "ghost"));
        assert!(graph
            .get_entity_children("ghost", RelationshipType::Host)
            .is_err());
    }

    #[test]
    fn get_or_create_does_not_persist() {
        let graph = service();
        let fresh = graph.get_or_create_entity("new").unwrap();
        assert_eq!(fresh, RelationshipEntity::new("new"));
        assert!(graph.store().is_empty());
    }

    #[test]
    fn register_makes_entity_queryable() {
        let mut graph = service();
        graph.register_entity("lonely").unwrap();
        assert!(graph
            .get_entity_parents("lonely", RelationshipType::Normal)
            .unwrap()
            .is_empty());

        graph
            .add_entity_relationship("lonely", "friend", RelationshipType::Normal)
            .unwrap();
        graph.register_entity("lonely").unwrap();
        assert_eq!(
            graph.get_entity_parents("lonely", RelationshipType::Normal).unwrap(),
            vec!["friend"]
        );
    }

    #[test]
    fn self_and_empty_edges_rejected() {
        let mut graph = service();
        assert!(matches!(
            graph.add_entity_relationship("a", "a", RelationshipType::Normal),
            Err(DrDocerError::InvalidEntity { .. })
        ));
        assert!(matches!(
            graph.add_entity_relationship("", "a", RelationshipType::Normal),
            Err(DrDocerError::InvalidEntity { .. })
        ));
        assert!(graph.store().is_empty());
    }

    #[test]
    fn clear_forgets_edges() {
        let mut graph = service();
        graph
            .add_entity_relationship("web1", "host1", RelationshipType::Host)
            .unwrap();
        graph.clear().unwrap();

        assert!(graph.store().is_empty());
        assert!(matches!(
            graph.get_entity_parents("web1", RelationshipType::Host),
            Err(DrDocerError::NotFound(_))
        ));
    }

    /// Store that fails every upsert after the first `allowed` ones.
    struct FlakyStore {
        inner: MemoryRelationshipStore,
        allowed: usize,
    }

    impl RelationshipStore for FlakyStore {
        fn get_entity_by_name(&self, name: &str) -> Result<Option<RelationshipEntity>> {
            self.inner.get_entity_by_name(name)
        }

        fn upsert_entity(&mut self, entity: RelationshipEntity) -> Result<()> {
            if self.allowed == 0 {
                return Err(DrDocerError::Storage("disk full".into()));
            }
            self.allowed -= 1;
            self.inner.upsert_entity(entity)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn failed_parent_write_leaves_child_side() {
        let mut graph = RelationshipService::new(FlakyStore {
            inner: MemoryRelationshipStore::new(),
            allowed: 1,
        });
        let err = graph
            .add_entity_relationship("web1", "host1", RelationshipType::Host)
            .unwrap_err();
        assert!(matches!(err, DrDocerError::Storage(_)));

        assert_eq!(
            graph.get_entity_parents("web1", RelationshipType::Host).unwrap(),
            vec!["host1"]
        );
        assert!(graph
            .get_entity_children("host1", RelationshipType::Host)
            .is_err());
    }

    #[test]
    fn failing_first_write_stores_nothing() {
        let mut graph = RelationshipService::new(FlakyStore {
            inner: MemoryRelationshipStore::new(),
            allowed: 0,
        });
        assert!(graph
            .add_entity_relationship("web1", "host1", RelationshipType::Host)
            .is_err());
        assert!(graph.store().inner.is_empty());
    }
}

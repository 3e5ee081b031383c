//! Nodes and edges of the relationship graph.

use serde::{Deserialize, Serialize};

/// Kind of dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Plain dependency (a service uses a database).
    Normal,
    /// Hosting (a service runs on a server).
    Host,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 2] = [RelationshipType::Normal, RelationshipType::Host];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Host => "host",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed edge pointing at another relationship entity by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipType,
    pub target: String,
}

impl Relationship {
    pub fn new(kind: RelationshipType, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

/// A named node holding both directions of its edges.
///
/// `depends_on` lists parents (what this entity needs), `dependents` lists
/// children (what needs this entity).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEntity {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<Relationship>,
    #[serde(default)]
    pub dependents: Vec<Relationship>,
}

impl RelationshipEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            dependents: Vec::new(),
        }
    }

    /// Append a parent edge unless an identical one exists. Returns whether
    /// the edge was added.
    pub fn add_depends_on(&mut self, relationship: Relationship) -> bool {
        push_unique(&mut self.depends_on, relationship)
    }

    /// Append a child edge unless an identical one exists.
    pub fn add_dependent(&mut self, relationship: Relationship) -> bool {
        push_unique(&mut self.dependents, relationship)
    }

    /// Parent names reached through edges of `kind`, in insertion order.
    pub fn parents(&self, kind: RelationshipType) -> Vec<String> {
        targets(&self.depends_on, kind)
    }

    /// Child names reached through edges of `kind`, in insertion order.
    pub fn children(&self, kind: RelationshipType) -> Vec<String> {
        targets(&self.dependents, kind)
    }
}

fn push_unique(edges: &mut Vec<Relationship>, relationship: Relationship) -> bool {
    if edges.contains(&relationship) {
        return false;
    }
    edges.push(relationship);
    true
}

fn targets(edges: &[Relationship], kind: RelationshipType) -> Vec<String> {
    edges
        .iter()
        .filter(|edge| edge.kind == kind)
        .map(|edge| edge.target.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_edges_are_not_duplicated() {
        let mut entity = RelationshipEntity::new("web1");
        assert!(entity.add_depends_on(Relationship::new(RelationshipType::Host, "host1")));
        assert!(!entity.add_depends_on(Relationship::new(RelationshipType::Host, "host1")));
        assert!(entity.add_depends_on(Relationship::new(RelationshipType::Normal, "host1")));
        assert_eq!(entity.depends_on.len(), 2);
    }

    #[test]
    fn targets_filter_by_kind() {
        let mut entity = RelationshipEntity::new("db1");
        entity.add_dependent(Relationship::new(RelationshipType::Normal, "api"));
        entity.add_dependent(Relationship::new(RelationshipType::Host, "ignored"));
        entity.add_dependent(Relationship::new(RelationshipType::Normal, "worker"));
        assert_eq!(entity.children(RelationshipType::Normal), vec!["api", "worker"]);
        assert_eq!(entity.children(RelationshipType::Host), vec!["ignored"]);
        assert!(entity.parents(RelationshipType::Normal).is_empty());
    }

    #[test]
    fn serializes_with_lowercase_kinds() {
        let mut entity = RelationshipEntity::new("web1");
        entity.add_depends_on(Relationship::new(RelationshipType::Host, "host1"));
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains(r#""kind":"host""#));

        let parsed: RelationshipEntity = serde_json::from_str(r#"{"name":"bare"}"#).unwrap();
        assert_eq!(parsed, RelationshipEntity::new("bare"));
    }
}

//! Core identity and output types for DrDocer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the run manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// EntityName / EntityType
// ---------------------------------------------------------------------------

/// Name of a discovered entity (e.g. `web1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of entity. An open set: any string is a valid type, the constants
/// below are the ones DrDocer knows how to discover out of the box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(pub String);

impl EntityType {
    pub const SERVER: &'static str = "server";
    pub const SERVICE: &'static str = "service";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn server() -> Self {
        Self::new(Self::SERVER)
    }

    pub fn service() -> Self {
        Self::new(Self::SERVICE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of an entity: two entities with the same id are the same
/// real-world object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub name: EntityName,
    pub entity_type: EntityType,
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.name)
    }
}

// ---------------------------------------------------------------------------
// MergePolicy
// ---------------------------------------------------------------------------

/// What happens to attributes that only the incoming entity carries when two
/// entities with the same identity are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Adopt incoming-only attributes with their own priority.
    #[default]
    Union,
    /// Reconcile only attributes present on both sides; incoming-only
    /// attributes are dropped.
    Overlapping,
}

// ---------------------------------------------------------------------------
// RunManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` written at the root of the output directory after a
/// generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Time-sortable identifier of the run.
    pub run_id: Uuid,
    /// Tool version that produced the output.
    pub tool_version: String,
    /// When the run finished writing documents.
    pub generated_at: DateTime<Utc>,
    /// One entry per rendered document, in write order.
    pub documents: Vec<DocumentRecord>,
}

/// A single rendered document listed in the run manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub entity_name: EntityName,
    pub entity_type: EntityType,
    /// Path relative to the output directory (e.g. `server/web1.md`).
    pub path: String,
    /// SHA-256 of the document bytes.
    pub sha256: String,
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        let id = EntityId {
            name: "web1".into(),
            entity_type: EntityType::server(),
        };
        assert_eq!(id.to_string(), "server/web1");
    }

    #[test]
    fn manifest_serialization() {
        let manifest = RunManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: Uuid::now_v7(),
            tool_version: "0.1.0".into(),
            generated_at: Utc::now(),
            documents: vec![DocumentRecord {
                entity_name: "web1".into(),
                entity_type: EntityType::server(),
                path: "server/web1.md".into(),
                sha256: "abc".into(),
                size_bytes: 3,
            }],
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        assert!(json.contains("\"entity_type\": \"server\""));
        let parsed: RunManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.documents[0].entity_name.as_str(), "web1");
    }
}

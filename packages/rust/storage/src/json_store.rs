//! Relationship store persisted as a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use drdocer_relationship::{RelationshipEntity, RelationshipStore};
use drdocer_shared::{DrDocerError, Result};

use crate::atomic::write_json;

/// On-disk shape of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    entities: Vec<RelationshipEntity>,
}

/// A [`RelationshipStore`] whose contents survive the process.
///
/// The whole file is loaded on open and rewritten after every upsert.
#[derive(Debug)]
pub struct JsonRelationshipStore {
    path: PathBuf,
    entities: BTreeMap<String, RelationshipEntity>,
}

impl JsonRelationshipStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let entities = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| DrDocerError::io(path, e))?;
            let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
                DrDocerError::Storage(format!("invalid relationship store {}: {e}", path.display()))
            })?;
            file.entities
                .into_iter()
                .map(|entity| (entity.name.clone(), entity))
                .collect()
        } else {
            BTreeMap::new()
        };

        debug!(entities = entities.len(), "relationship store opened");
        Ok(Self {
            path: path.to_path_buf(),
            entities,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| DrDocerError::io(dir, e))?;
        }
        let file = StoreFile {
            entities: self.entities.values().cloned().collect(),
        };
        write_json(&self.path, &file)
    }
}

impl RelationshipStore for JsonRelationshipStore {
    fn get_entity_by_name(&self, name: &str) -> Result<Option<RelationshipEntity>> {
        Ok(self.entities.get(name).cloned())
    }

    fn upsert_entity(&mut self, entity: RelationshipEntity) -> Result<()> {
        self.entities.insert(entity.name.clone(), entity);
        self.save()
    }

    fn clear(&mut self) -> Result<()> {
        self.entities.clear();
        self.save()
    }
}

//! Entity source reading YAML records from a data directory.
//!
//! Each matching file may hold several YAML documents, one record each:
//!
//! ```yaml
//! type: service
//! name: billing
//! url: https://billing.internal
//! host: app1
//! dependencies: [postgres1]
//! ```
//!
//! A record without `type` takes it from the first directory in its path
//! that appears in `directory_mappers`. Malformed records are skipped with a
//! warning; unreadable files abort the source.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use drdocer_metadata::{AttributeRegistry, Entity};
use drdocer_shared::{AppConfig, DrDocerError, EntityType, FilesystemSourceConfig, Result};

use crate::EntitySource;
use crate::collection::EntityCollection;
use crate::schemas::BuiltinSchemas;

/// Raw shape of one YAML document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilesystemRecord {
    #[serde(rename = "type")]
    entity_type: Option<String>,
    name: Option<String>,
    ip_address: Option<String>,
    url: Option<String>,
    host: Option<String>,
    dependencies: Vec<String>,
    description: Option<String>,
}

/// Discovers servers and services from YAML files on disk.
#[derive(Debug)]
pub struct FilesystemSource {
    base_directory: PathBuf,
    extensions: Vec<String>,
    directory_mappers: Vec<(String, EntityType)>,
    priority: i32,
    schemas: BuiltinSchemas,
}

impl FilesystemSource {
    /// Create a source over `config.data_directory`, which must be an
    /// existing directory.
    pub fn new(config: &FilesystemSourceConfig, registry: &AttributeRegistry) -> Result<Self> {
        let base_directory = PathBuf::from(&config.data_directory);
        let metadata = std::fs::metadata(&base_directory).map_err(|e| {
            DrDocerError::config(format!(
                "data directory {} is not accessible: {e}",
                base_directory.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(DrDocerError::config(format!(
                "data directory {} is not a directory",
                base_directory.display()
            )));
        }

        Ok(Self {
            base_directory,
            extensions: config
                .file_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            directory_mappers: config
                .directory_mappers
                .iter()
                .map(|(dir, kind)| (dir.clone(), EntityType::new(kind.as_str())))
                .collect(),
            priority: config.priority,
            schemas: BuiltinSchemas::resolve(registry)?,
        })
    }

    /// Create the source from the `[filesystem]` section of the app config.
    pub fn from_app_config(config: &AppConfig, registry: &AttributeRegistry) -> Result<Self> {
        let section = config
            .filesystem
            .as_ref()
            .ok_or_else(|| DrDocerError::NilConfig("[filesystem] section is missing".into()))?;
        Self::new(section, registry)
    }

    /// Record files under the base directory, sorted by path.
    fn find_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base_directory).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.base_directory.clone());
                DrDocerError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.extensions.iter().any(|e| e == ext));
            if matches {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Entity type implied by the directories a file lives in.
    fn type_from_path(&self, file_path: &Path) -> Option<EntityType> {
        let relative = file_path
            .strip_prefix(&self.base_directory)
            .unwrap_or(file_path);
        relative.components().find_map(|component| {
            let part = component.as_os_str().to_str()?;
            self.directory_mappers
                .iter()
                .find(|(dir, _)| dir == part)
                .map(|(_, kind)| kind.clone())
        })
    }

    fn process_file(&self, collection: &mut EntityCollection, file_path: &Path) -> Result<()> {
        let content =
            std::fs::read_to_string(file_path).map_err(|e| DrDocerError::io(file_path, e))?;

        for (index, document) in serde_yaml::Deserializer::from_str(&content).enumerate() {
            let record = match Option::<FilesystemRecord>::deserialize(document) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %file_path.display(), document = index, error = %e, "skipping undecodable document");
                    continue;
                }
            };

            match self.build_entity(record, file_path) {
                Ok(entity) => collection.add_entity(entity)?,
                Err(e) => {
                    warn!(path = %file_path.display(), document = index, error = %e, "skipping record");
                }
            }
        }
        Ok(())
    }

    fn build_entity(&self, record: FilesystemRecord, file_path: &Path) -> Result<Entity> {
        let entity_type = match record.entity_type.filter(|t| !t.is_empty()) {
            Some(kind) => EntityType::new(kind),
            None => self
                .type_from_path(file_path)
                .ok_or_else(|| DrDocerError::invalid_entity("record has no type"))?,
        };
        let name = record
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DrDocerError::invalid_entity("record has no name"))?;

        let mut entity = Entity::new(name, entity_type.clone(), self.priority);

        match entity_type.as_str() {
            EntityType::SERVER => {
                if let Some(ip) = record.ip_address {
                    ip.parse::<IpAddr>().map_err(|e| {
                        DrDocerError::validation(format!("invalid ip_address {ip:?}: {e}"))
                    })?;
                    entity.set_attribute(&self.schemas.ip_address, ip.into())?;
                }
            }
            EntityType::SERVICE => {
                if let Some(url) = record.url {
                    url::Url::parse(&url).map_err(|e| {
                        DrDocerError::validation(format!("invalid url {url:?}: {e}"))
                    })?;
                    entity.set_attribute(&self.schemas.url, url.into())?;
                }
            }
            other => {
                return Err(DrDocerError::invalid_entity(format!(
                    "unknown entity type: {other}"
                )));
            }
        }

        if let Some(host) = record.host.filter(|h| !h.is_empty()) {
            entity.set_attribute(&self.schemas.host, host.into())?;
        }
        if !record.dependencies.is_empty() {
            entity.set_attribute(&self.schemas.dependencies, record.dependencies.into())?;
        }
        if let Some(description) = record.description {
            entity.set_attribute(&self.schemas.description, description.into())?;
        }

        debug!(entity = %entity.id(), attributes = entity.attribute_count(), "decoded record");
        Ok(entity)
    }
}

impl EntitySource for FilesystemSource {
    #[instrument(skip_all, fields(base = %self.base_directory.display()))]
    fn get_entities(&self, collection: &mut EntityCollection) -> Result<()> {
        let files = self.find_files()?;
        info!(files = files.len(), "scanning record files");

        for file_path in &files {
            self.process_file(collection, file_path)?;
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use drdocer_metadata::{
        ATTRIBUTE_DEPENDENCIES, ATTRIBUTE_DESCRIPTION, ATTRIBUTE_HOST, ATTRIBUTE_IP_ADDRESS,
        ATTRIBUTE_URL,
    };

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "drdocer-filesystem-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn make_config(dir: &Path) -> FilesystemSourceConfig {
        FilesystemSourceConfig {
            data_directory: dir.to_string_lossy().to_string(),
            ..FilesystemSourceConfig::default()
        }
    }

    fn load(dir: &Path) -> EntityCollection {
        let registry = AttributeRegistry::builtin().unwrap();
        let source = FilesystemSource::new(&make_config(dir), &registry).unwrap();
        let mut collection = EntityCollection::new();
        source.get_entities(&mut collection).unwrap();
        collection
    }

    #[test]
    fn decodes_multi_document_files() {
        let tmp = temp_dir();
        write(
            &tmp,
            "inventory.yaml",
            "type: server\nname: web1\nip_address: 10.0.0.5\n---\n\
             type: service\nname: shop\nurl: https://shop.example.com\nhost: web1\n\
             dependencies: [db1, cache1]\ndescription: Storefront\n",
        );

        let collection = load(&tmp);
        assert_eq!(collection.len(), 2);

        let web1 = collection
            .get_entity_by_name_and_type("web1", &EntityType::server())
            .unwrap();
        assert_eq!(web1.string_value(ATTRIBUTE_IP_ADDRESS), Some("10.0.0.5"));
        assert_eq!(web1.attribute(ATTRIBUTE_IP_ADDRESS).unwrap().priority(), 50);

        let shop = collection
            .get_entity_by_name_and_type("shop", &EntityType::service())
            .unwrap();
        assert_eq!(shop.string_value(ATTRIBUTE_URL), Some("https://shop.example.com"));
        assert_eq!(shop.string_value(ATTRIBUTE_HOST), Some("web1"));
        assert_eq!(shop.list_value(ATTRIBUTE_DEPENDENCIES), vec!["db1", "cache1"]);
        assert_eq!(shop.string_value(ATTRIBUTE_DESCRIPTION), Some("Storefront"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn type_comes_from_mapped_directory() {
        let tmp = temp_dir();
        write(&tmp, "servers/db1.yml", "name: db1\nip_address: 10.0.0.9\n");
        write(&tmp, "services/api.yaml", "name: api\nurl: http://api.local\n");

        let collection = load(&tmp);
        assert!(collection
            .get_entity_by_name_and_type("db1", &EntityType::server())
            .is_some());
        assert!(collection
            .get_entity_by_name_and_type("api", &EntityType::service())
            .is_some());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bad_records_are_skipped() {
        let tmp = temp_dir();
        write(
            &tmp,
            "mixed.yaml",
            "name: orphan\n---\n\
             type: server\n---\n\
             type: printer\nname: p1\n---\n\
             type: service\nname: broken\nurl: not a url\n---\n\
             type: server\nname: bad-ip\nip_address: 999.1.1.1\n---\n\
             type: server\nname: good\n",
        );

        let collection = load(&tmp);
        let names: Vec<&str> = collection
            .entities()
            .iter()
            .map(|e| e.name().as_str())
            .collect();
        assert_eq!(names, vec!["good"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ignores_other_extensions() {
        let tmp = temp_dir();
        write(&tmp, "notes.txt", "type: server\nname: hidden\n");
        write(&tmp, "a.yaml", "---\ntype: server\nname: visible\n");

        let collection = load(&tmp);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.entities()[0].name().as_str(), "visible");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn duplicate_records_merge() {
        let tmp = temp_dir();
        write(&tmp, "a.yaml", "type: service\nname: api\nurl: http://a.local\n");
        write(&tmp, "b.yaml", "type: service\nname: api\ndescription: API\n");

        let collection = load(&tmp);
        assert_eq!(collection.len(), 1);
        let api = &collection.entities()[0];
        assert_eq!(api.string_value(ATTRIBUTE_URL), Some("http://a.local"));
        assert_eq!(api.string_value(ATTRIBUTE_DESCRIPTION), Some("API"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_directory_is_config_error() {
        let registry = AttributeRegistry::builtin().unwrap();
        let config = FilesystemSourceConfig {
            data_directory: "/nonexistent/drdocer/data".into(),
            ..FilesystemSourceConfig::default()
        };
        let err = FilesystemSource::new(&config, &registry).unwrap_err();
        assert!(matches!(err, DrDocerError::Config { .. }));
    }

    #[test]
    fn file_as_data_directory_is_rejected() {
        let tmp = temp_dir();
        write(&tmp, "file.yaml", "name: x\n");
        let registry = AttributeRegistry::builtin().unwrap();
        let config = FilesystemSourceConfig {
            data_directory: tmp.join("file.yaml").to_string_lossy().to_string(),
            ..FilesystemSourceConfig::default()
        };
        let err = FilesystemSource::new(&config, &registry).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn registry_without_builtin_schemas_fails() {
        let tmp = temp_dir();
        let err = FilesystemSource::new(&make_config(&tmp), &AttributeRegistry::new()).unwrap_err();
        assert!(matches!(err, DrDocerError::UnknownAttribute(_)));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}

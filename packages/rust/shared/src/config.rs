//! Application configuration for DrDocer.
//!
//! Lookup order: explicit `--config` path, `./drdocer.toml`,
//! `~/.drdocer/drdocer.toml`, then built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DrDocerError, Result};
use crate::types::{EntityType, MergePolicy};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "drdocer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".drdocer";

/// Source kind for the filesystem YAML source.
pub const FILESYSTEM_SOURCE: &str = "filesystem";

/// Source kind for the Terraform definitions source.
pub const TERRAFORM_SOURCE: &str = "terraform";

// ---------------------------------------------------------------------------
// Config structs (matching drdocer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity sources to run, by kind.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Filesystem source settings. `None` when the section is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemSourceConfig>,

    /// Terraform source settings. `None` when the section is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform: Option<TerraformSourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            defaults: DefaultsConfig::default(),
            filesystem: Some(FilesystemSourceConfig::default()),
            terraform: Some(TerraformSourceConfig::default()),
        }
    }
}

fn default_sources() -> Vec<String> {
    vec![FILESYSTEM_SOURCE.to_string()]
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory rendered documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory holding `*.md` document templates.
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    /// How incoming-only attributes are treated on merge.
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            template_dir: default_template_dir(),
            merge_policy: MergePolicy::default(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_template_dir() -> String {
    "./templates".into()
}

/// `[filesystem]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemSourceConfig {
    /// Root directory scanned for entity records.
    #[serde(default = "default_data_directory")]
    pub data_directory: String,

    /// File extensions (with leading dot) treated as record files.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    /// Priority of the facts this source contributes.
    #[serde(default = "default_filesystem_priority")]
    pub priority: i32,

    /// Directory name → entity type, used when a record omits `type`.
    #[serde(default = "default_directory_mappers")]
    pub directory_mappers: BTreeMap<String, String>,
}

impl Default for FilesystemSourceConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            file_extensions: default_file_extensions(),
            priority: default_filesystem_priority(),
            directory_mappers: default_directory_mappers(),
        }
    }
}

fn default_data_directory() -> String {
    "./data".into()
}
fn default_file_extensions() -> Vec<String> {
    vec![".yaml".into(), ".yml".into()]
}
fn default_filesystem_priority() -> i32 {
    50
}
fn default_directory_mappers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("servers".to_string(), EntityType::SERVER.to_string()),
        ("services".to_string(), EntityType::SERVICE.to_string()),
    ])
}

/// `[terraform]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformSourceConfig {
    /// Directory scanned recursively for `*.tf` files.
    #[serde(default = "default_terraform_directory")]
    pub directory: String,

    /// Priority of the facts this source contributes.
    #[serde(default = "default_terraform_priority")]
    pub priority: i32,

    /// Resource type (e.g. `aws_instance`) → entity type. Resources of
    /// unmapped types are ignored.
    #[serde(default = "default_resource_mappers")]
    pub resource_mappers: BTreeMap<String, String>,

    /// Entity type given to `module` blocks. Empty disables modules.
    #[serde(default = "default_module_entity_type")]
    pub module_entity_type: String,
}

impl Default for TerraformSourceConfig {
    fn default() -> Self {
        Self {
            directory: default_terraform_directory(),
            priority: default_terraform_priority(),
            resource_mappers: default_resource_mappers(),
            module_entity_type: default_module_entity_type(),
        }
    }
}

fn default_terraform_directory() -> String {
    "./terraform".into()
}
fn default_terraform_priority() -> i32 {
    40
}
fn default_resource_mappers() -> BTreeMap<String, String> {
    let server = EntityType::SERVER.to_string();
    let service = EntityType::SERVICE.to_string();
    BTreeMap::from([
        ("aws_instance".to_string(), server.clone()),
        ("google_compute_instance".to_string(), server.clone()),
        ("azurerm_linux_virtual_machine".to_string(), server),
        ("aws_lambda_function".to_string(), service.clone()),
        ("aws_lb".to_string(), service),
    ])
}
fn default_module_entity_type() -> String {
    EntityType::SERVICE.to_string()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.drdocer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DrDocerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.drdocer/drdocer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve and load the application config.
///
/// An explicit path must exist. Without one, `./drdocer.toml` and then the
/// user config file are tried; defaults are returned when neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DrDocerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DrDocerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| DrDocerError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DrDocerError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| DrDocerError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("data_directory"));
        assert!(toml_str.contains("merge_policy = \"union\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.sources, vec!["filesystem".to_string()]);
        let fs = parsed.filesystem.expect("filesystem section");
        assert_eq!(fs.priority, 50);
        assert_eq!(fs.file_extensions, vec![".yaml", ".yml"]);
    }

    #[test]
    fn config_with_mappers() {
        let toml_str = r#"
sources = ["filesystem"]

[defaults]
output_dir = "/tmp/docs"
merge_policy = "overlapping"

[filesystem]
data_directory = "/srv/data"

[filesystem.directory_mappers]
servers = "server"
services = "service"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/docs");
        assert_eq!(config.defaults.template_dir, "./templates");
        assert_eq!(config.defaults.merge_policy, MergePolicy::Overlapping);
        let fs = config.filesystem.expect("filesystem section");
        assert_eq!(fs.directory_mappers.get("servers").map(String::as_str), Some("server"));
        assert_eq!(fs.priority, 50);
    }

    #[test]
    fn terraform_section_defaults() {
        let toml_str = r#"
sources = ["terraform"]

[terraform]
directory = "/srv/infra"

[terraform.resource_mappers]
hcloud_server = "server"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let tf = config.terraform.expect("terraform section");
        assert_eq!(tf.directory, "/srv/infra");
        assert_eq!(tf.priority, 40);
        assert_eq!(tf.module_entity_type, "service");
        assert_eq!(tf.resource_mappers.len(), 1);
        assert!(config.filesystem.is_none());
    }

    #[test]
    fn missing_filesystem_section_is_none() {
        let config: AppConfig = toml::from_str("sources = []\n").expect("parse");
        assert!(config.filesystem.is_none());
        assert!(config.terraform.is_none());
        assert!(config.sources.is_empty());
    }

    #[test]
    fn init_and_load_from_path() {
        let dir = std::env::temp_dir().join(format!("drdocer-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join("drdocer.toml");

        init_config(&path).expect("init config");
        let loaded = load_config(Some(&path)).expect("load config");
        assert_eq!(loaded.defaults.output_dir, "./output");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_missing_path_errors() {
        let path = std::env::temp_dir().join(format!("drdocer-missing-{}.toml", uuid::Uuid::now_v7()));
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, DrDocerError::Io { .. }));
    }
}

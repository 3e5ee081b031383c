//! Shared types, error model, and configuration for DrDocer.
//!
//! This crate is the foundation depended on by all other DrDocer crates.
//! It provides:
//! - [`DrDocerError`]: the unified error type
//! - Identity types ([`EntityName`], [`EntityType`], [`EntityId`]) and the
//!   [`RunManifest`] written after generation
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FILESYSTEM_SOURCE, FilesystemSourceConfig, TERRAFORM_SOURCE,
    TerraformSourceConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DrDocerError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, DocumentRecord, EntityId, EntityName, EntityType, MergePolicy,
    RunManifest,
};

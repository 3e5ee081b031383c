use tracing::{info, instrument, warn};

use drdocer_metadata::AttributeRegistry;
use drdocer_shared::{
    AppConfig, DrDocerError, FILESYSTEM_SOURCE, MergePolicy, Result, TERRAFORM_SOURCE,
};

use crate::EntitySource;
use crate::collection::EntityCollection;
use crate::filesystem::FilesystemSource;
use crate::terraform::TerraformSource;

/// Drives registered sources to populate one fresh collection.
#[derive(Default)]
pub struct EntityFactory {
    sources: Vec<Box<dyn EntitySource>>,
    merge_policy: MergePolicy,
}

impl EntityFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge_policy(merge_policy: MergePolicy) -> Self {
        Self {
            sources: Vec::new(),
            merge_policy,
        }
    }

    /// Build a factory with every source kind listed in `config.sources`.
    pub fn from_config(config: &AppConfig, registry: &AttributeRegistry) -> Result<Self> {
        let mut factory = Self::with_merge_policy(config.defaults.merge_policy);
        for kind in &config.sources {
            factory.register_entity_source(build_source(kind, config, registry)?);
        }
        if factory.sources.is_empty() {
            warn!("no entity sources configured");
        }
        Ok(factory)
    }

    /// Append a source. Sources are not deduplicated.
    pub fn register_entity_source(&mut self, source: Box<dyn EntitySource>) {
        self.sources.push(source);
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Run every source against a fresh collection.
    ///
    /// Sources run by descending priority; equal priorities keep
    /// registration order. The first failing source aborts the load and no
    /// collection is returned.
    #[instrument(skip_all, fields(sources = self.sources.len()))]
    pub fn load_entities(&self) -> Result<EntityCollection> {
        let mut collection = EntityCollection::with_merge_policy(self.merge_policy);

        let mut ordered: Vec<&dyn EntitySource> =
            self.sources.iter().map(|source| source.as_ref()).collect();
        ordered.sort_by_key(|source| std::cmp::Reverse(source.priority()));

        for source in ordered {
            let before = collection.len();
            source
                .get_entities(&mut collection)
                .map_err(|e| DrDocerError::source_failure(source.name(), e))?;
            info!(
                source = source.name(),
                priority = source.priority(),
                new_entities = collection.len() - before,
                "entity source complete"
            );
        }

        info!(entities = collection.len(), "entity load complete");
        Ok(collection)
    }
}

/// Construct the source registered under `kind`.
///
/// Fails with `NilSource` for kinds DrDocer does not provide and with
/// `NilConfig` when the kind's config section is missing.
pub fn build_source(
    kind: &str,
    config: &AppConfig,
    registry: &AttributeRegistry,
) -> Result<Box<dyn EntitySource>> {
    match kind {
        FILESYSTEM_SOURCE => Ok(Box::new(FilesystemSource::from_app_config(
            config, registry,
        )?)),
        TERRAFORM_SOURCE => Ok(Box::new(TerraformSource::from_app_config(
            config, registry,
        )?)),
        other => Err(DrDocerError::NilSource(format!(
            "no entity source of kind {other:?}"
        ))),
    }
}

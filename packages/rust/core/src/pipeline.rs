//! End-to-end `generate` pipeline: sources → merge → relate → render → store.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use drdocer_discovery::{EntityCollection, EntityFactory};
use drdocer_metadata::AttributeRegistry;
use drdocer_relationship::{RelationshipService, RelationshipStore};
use drdocer_render::{DocumentGenerator, DocumentStorage};
use drdocer_shared::{AppConfig, Result};

use crate::relate::build_relationships;

/// Result of a `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Distinct entities after merging.
    pub entity_count: usize,
    /// Relationship edges derived from attributes.
    pub edge_count: usize,
    /// Documents handed to storage.
    pub document_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document is stored.
    fn document_generated(&self, entity: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_generated(&self, _entity: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Run every configured source and return the merged collection.
#[instrument(skip_all, fields(sources = ?config.sources))]
pub fn discover(config: &AppConfig) -> Result<EntityCollection> {
    let registry = AttributeRegistry::builtin()?;
    let factory = EntityFactory::from_config(config, &registry)?;
    factory.load_entities()
}

/// Run the full pipeline.
///
/// 1. Load templates (fails early on a bad template directory)
/// 2. Discover and merge entities
/// 3. Record relationship edges in `graph`
/// 4. Render one document per entity into `storage`
/// 5. Finish storage
///
/// Any error aborts the run.
#[instrument(skip_all, fields(templates = %config.defaults.template_dir))]
pub fn generate<S: RelationshipStore>(
    config: &AppConfig,
    graph: &mut RelationshipService<S>,
    storage: &mut dyn DocumentStorage,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();

    progress.phase("Loading templates");
    let generator = DocumentGenerator::new(Path::new(&config.defaults.template_dir))?;

    progress.phase("Discovering entities");
    let collection = discover(config)?;

    progress.phase("Building relationships");
    let stats = build_relationships(&collection, graph)?;

    progress.phase("Rendering documents");
    let total = collection.len();
    for (i, entity) in collection.entities().iter().enumerate() {
        generator.generate_document(entity, graph, storage)?;
        progress.document_generated(entity.name().as_str(), i + 1, total);
    }
    storage.finish()?;

    let result = GenerateResult {
        entity_count: collection.len(),
        edge_count: stats.edges,
        document_count: total,
        elapsed: start.elapsed(),
    };

    info!(
        entities = result.entity_count,
        edges = result.edge_count,
        documents = result.document_count,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "generate pipeline complete"
    );
    progress.done(&result);

    Ok(result)
}

//! Document storage backends.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use drdocer_render::DocumentStorage;
use drdocer_shared::{
    CURRENT_SCHEMA_VERSION, DocumentRecord, DrDocerError, EntityName, EntityType, Result,
    RunManifest,
};

use crate::atomic::{write_atomic, write_json};

/// Manifest file name at the root of the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Writes `<output>/<type>/<name>.md` and a run manifest on finish.
#[derive(Debug)]
pub struct FilesystemDocumentStorage {
    output_directory: PathBuf,
    tool_version: String,
    run_id: Uuid,
    documents: Vec<DocumentRecord>,
}

impl FilesystemDocumentStorage {
    /// Fails when `output_directory` exists and is not a directory. A missing
    /// directory is created on first write.
    pub fn new(output_directory: impl Into<PathBuf>, tool_version: impl Into<String>) -> Result<Self> {
        let output_directory = output_directory.into();
        if output_directory.exists() && !output_directory.is_dir() {
            return Err(DrDocerError::Storage(format!(
                "output path {} is not a directory",
                output_directory.display()
            )));
        }

        Ok(Self {
            output_directory,
            tool_version: tool_version.into(),
            run_id: Uuid::now_v7(),
            documents: Vec::new(),
        })
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Documents written so far in this run.
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }
}

impl DocumentStorage for FilesystemDocumentStorage {
    fn store_document(
        &mut self,
        name: &EntityName,
        entity_type: &EntityType,
        document: &[u8],
    ) -> Result<()> {
        check_path_segment(name.as_str())?;
        check_path_segment(entity_type.as_str())?;

        let type_dir = self.output_directory.join(entity_type.as_str());
        std::fs::create_dir_all(&type_dir).map_err(|e| DrDocerError::io(&type_dir, e))?;

        let file_name = format!("{name}.md");
        let target = type_dir.join(&file_name);
        write_atomic(&target, document)?;

        let mut hasher = Sha256::new();
        hasher.update(document);
        let hash = format!("{:x}", hasher.finalize());

        debug!(path = %target.display(), size = document.len(), "wrote document");
        self.documents.push(DocumentRecord {
            entity_name: name.clone(),
            entity_type: entity_type.clone(),
            path: format!("{entity_type}/{file_name}"),
            sha256: hash,
            size_bytes: document.len(),
        });
        Ok(())
    }

    #[instrument(skip_all, fields(dir = %self.output_directory.display()))]
    fn finish(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.output_directory)
            .map_err(|e| DrDocerError::io(&self.output_directory, e))?;

        let manifest = RunManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: self.run_id,
            tool_version: self.tool_version.clone(),
            generated_at: Utc::now(),
            documents: self.documents.clone(),
        };
        write_json(&self.output_directory.join(MANIFEST_FILE_NAME), &manifest)?;

        info!(documents = self.documents.len(), "run manifest written");
        Ok(())
    }
}

/// Names become file and directory names and must stay inside the output
/// directory.
fn check_path_segment(segment: &str) -> Result<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.contains('\0');
    if invalid {
        return Err(DrDocerError::Storage(format!(
            "{segment:?} cannot be used as a document path segment"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stdout
// ---------------------------------------------------------------------------

/// Prints each document followed by a newline.
pub struct StdoutDocumentStorage<W: Write = std::io::Stdout> {
    writer: W,
}

impl StdoutDocumentStorage {
    pub fn new() -> Self {
        Self {
            writer: std::io::stdout(),
        }
    }
}

impl Default for StdoutDocumentStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutDocumentStorage<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentStorage for StdoutDocumentStorage<W> {
    fn store_document(
        &mut self,
        _name: &EntityName,
        _entity_type: &EntityType,
        document: &[u8],
    ) -> Result<()> {
        self.writer
            .write_all(document)
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|e| DrDocerError::io("<stdout>", e))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| DrDocerError::io("<stdout>", e))
    }
}

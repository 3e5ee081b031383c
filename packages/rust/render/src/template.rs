//! Template discovery and front-matter parsing.
//!
//! A template is a `*.md` file whose first block declares the entity type it
//! renders:
//!
//! ```markdown
//! ---
//! entity_type: server
//! ---
//! # {{name}}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use drdocer_shared::{DrDocerError, EntityType, Result};

/// File extension of template files.
pub const TEMPLATE_EXTENSION: &str = "md";

/// Front matter every template carries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateMetadata {
    pub entity_type: String,
}

/// A loaded template: metadata plus the body handed to the renderer.
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    pub path: PathBuf,
    pub metadata: TemplateMetadata,
    pub body: String,
}

/// Split `content` into its front matter and body.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").expect("valid regex")
    });

    let captures = FRONT_MATTER_RE.captures(content)?;
    let whole = captures.get(0)?;
    let meta = captures.get(1)?;
    Some((meta.as_str(), &content[whole.end()..]))
}

/// Parse a template file's content.
pub fn parse_template(path: &Path, content: &str) -> Result<DocumentTemplate> {
    let (front, body) = split_front_matter(content).ok_or_else(|| {
        DrDocerError::parse(format!("{}: missing front matter", path.display()))
    })?;

    let metadata: TemplateMetadata = serde_yaml::from_str(front).map_err(|e| {
        DrDocerError::parse(format!("{}: invalid front matter: {e}", path.display()))
    })?;
    if metadata.entity_type.is_empty() {
        return Err(DrDocerError::Template(format!(
            "{}: entity_type must not be empty",
            path.display()
        )));
    }

    Ok(DocumentTemplate {
        path: path.to_path_buf(),
        metadata,
        body: body.to_string(),
    })
}

/// Load every template directly inside `directory`, keyed by entity type.
pub fn load_templates(directory: &Path) -> Result<BTreeMap<EntityType, DocumentTemplate>> {
    let meta = std::fs::metadata(directory).map_err(|e| DrDocerError::io(directory, e))?;
    if !meta.is_dir() {
        return Err(DrDocerError::Template(format!(
            "template directory {} is not a directory",
            directory.display()
        )));
    }

    let mut templates: BTreeMap<EntityType, DocumentTemplate> = BTreeMap::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| DrDocerError::io(directory, e.into()))?;
        let path = entry.path();
        let is_template = entry.file_type().is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(TEMPLATE_EXTENSION);
        if !is_template {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|e| DrDocerError::io(path, e))?;
        let template = parse_template(path, &content)?;
        let entity_type = EntityType::new(template.metadata.entity_type.as_str());

        if let Some(existing) = templates.get(&entity_type) {
            return Err(DrDocerError::Template(format!(
                "duplicate template for entity type {entity_type}: {} and {}",
                existing.path.display(),
                path.display()
            )));
        }
        debug!(path = %path.display(), %entity_type, "loaded template");
        templates.insert(entity_type, template);
    }

    Ok(templates)
}

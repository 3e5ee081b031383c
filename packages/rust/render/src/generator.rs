//! Renders entities through their type's template.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use tracing::{debug, info, instrument};

use drdocer_metadata::Entity;
use drdocer_relationship::{RelationshipService, RelationshipStore};
use drdocer_shared::{DrDocerError, EntityType, Result};

use crate::context::TemplateContext;
use crate::storage::DocumentStorage;
use crate::template::load_templates;

/// One compiled template per entity type.
pub struct DocumentGenerator {
    handlebars: Handlebars<'static>,
    template_directory: PathBuf,
    entity_types: Vec<EntityType>,
}

impl DocumentGenerator {
    /// Load and compile every template in `template_directory`.
    #[instrument(skip_all, fields(dir = %template_directory.display()))]
    pub fn new(template_directory: &Path) -> Result<Self> {
        let templates = load_templates(template_directory)?;

        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("join", Box::new(join_helper));
        handlebars.register_helper("uppercase", Box::new(uppercase_helper));

        for (entity_type, template) in &templates {
            handlebars
                .register_template_string(entity_type.as_str(), &template.body)
                .map_err(|e| {
                    DrDocerError::Template(format!("{}: {e}", template.path.display()))
                })?;
        }

        info!(templates = templates.len(), "templates loaded");
        Ok(Self {
            handlebars,
            template_directory: template_directory.to_path_buf(),
            entity_types: templates.into_keys().collect(),
        })
    }

    pub fn template_directory(&self) -> &Path {
        &self.template_directory
    }

    /// Entity types a template exists for, sorted.
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub fn has_template(&self, entity_type: &EntityType) -> bool {
        self.handlebars.has_template(entity_type.as_str())
    }

    /// Render `entity` with its attributes and graph edges.
    pub fn render<S: RelationshipStore>(
        &self,
        entity: &Entity,
        graph: &RelationshipService<S>,
    ) -> Result<String> {
        let entity_type = entity.entity_type();
        if !self.has_template(entity_type) {
            return Err(DrDocerError::Template(format!(
                "no template for entity type {entity_type}"
            )));
        }

        let context = TemplateContext::build(entity, graph)?;
        self.handlebars
            .render(entity_type.as_str(), &context)
            .map_err(|e| DrDocerError::Template(format!("rendering {}: {e}", entity.id())))
    }

    /// Render `entity` and hand the result to `storage`.
    pub fn generate_document<S: RelationshipStore>(
        &self,
        entity: &Entity,
        graph: &RelationshipService<S>,
        storage: &mut dyn DocumentStorage,
    ) -> Result<()> {
        let document = self.render(entity, graph)?;
        debug!(entity = %entity.id(), bytes = document.len(), "rendered document");
        storage.store_document(entity.name(), entity.entity_type(), document.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `{{join list ", "}}`: list items joined by the separator (default `, `).
fn join_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let separator = h.param(1).and_then(|v| v.value().as_str()).unwrap_or(", ");
    let items: Vec<String> = h
        .param(0)
        .and_then(|v| v.value().as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| match item.as_str() {
                    Some(s) => s.to_string(),
                    None => item.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    out.write(&items.join(separator))?;
    Ok(())
}

fn uppercase_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&param.to_uppercase())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use drdocer_metadata::{Attribute, AttributeValue, ValueType};
    use drdocer_relationship::{MemoryRelationshipStore, RelationshipType};
    use drdocer_shared::EntityName;

    use super::*;

    #[derive(Default)]
    struct CapturingStorage {
        documents: Vec<(String, String, String)>,
    }

    impl DocumentStorage for CapturingStorage {
        fn store_document(
            &mut self,
            name: &EntityName,
            entity_type: &EntityType,
            document: &[u8],
        ) -> Result<()> {
            self.documents.push((
                name.to_string(),
                entity_type.to_string(),
                String::from_utf8_lossy(document).into_owned(),
            ));
            Ok(())
        }
    }

    fn template_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("drdocer-generator-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    fn service_entity() -> Entity {
        let url = Arc::new(Attribute::new("url", ValueType::String, "".into()).unwrap());
        let deps = Arc::new(
            Attribute::new("dependencies", ValueType::List, AttributeValue::List(vec![])).unwrap(),
        );
        let mut entity = Entity::new("shop", EntityType::service(), 0);
        entity
            .set_attribute(&url, "https://shop.example.com/?a=1&b=2".into())
            .unwrap();
        entity
            .set_attribute(&deps, vec!["db1".to_string(), "cache1".to_string()].into())
            .unwrap();
        entity
    }

    #[test]
    fn renders_attributes_and_relationships() {
        let dir = template_dir(&[(
            "service.md",
            "---\nentity_type: service\n---\n# {{name}} ({{uppercase type}})\n\
             URL: {{attributes.url}}\n\
             Deps: {{join attributes.dependencies}}\n\
             Host: {{#each parents.host}}{{this}}{{/each}}\n\
             Owner: {{attributes.owner}}\n",
        )]);
        let generator = DocumentGenerator::new(&dir).unwrap();

        let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
        graph
            .add_entity_relationship("shop", "web1", RelationshipType::Host)
            .unwrap();

        let mut storage = CapturingStorage::default();
        generator
            .generate_document(&service_entity(), &graph, &mut storage)
            .unwrap();

        let (name, kind, body) = &storage.documents[0];
        assert_eq!(name, "shop");
        assert_eq!(kind, "service");
        assert_eq!(
            body,
            "# shop (SERVICE)\nURL: https://shop.example.com/?a=1&b=2\nDeps: db1, cache1\nHost: web1\nOwner: \n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_template_for_type_fails() {
        let dir = template_dir(&[("server.md", "---\nentity_type: server\n---\n{{name}}\n")]);
        let generator = DocumentGenerator::new(&dir).unwrap();
        assert_eq!(generator.entity_types(), &[EntityType::server()]);

        let graph = RelationshipService::new(MemoryRelationshipStore::new());
        let mut storage = CapturingStorage::default();
        let err = generator
            .generate_document(&service_entity(), &graph, &mut storage)
            .unwrap_err();
        assert!(matches!(err, DrDocerError::Template(_)));
        assert!(storage.documents.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_template_syntax_fails_construction() {
        let dir = template_dir(&[("server.md", "---\nentity_type: server\n---\n{{#each}}\n")]);
        assert!(matches!(
            DocumentGenerator::new(&dir),
            Err(DrDocerError::Template(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Entity source reading Terraform definitions.
//!
//! Every `*.tf` file under the configured directory is parsed as HCL and
//! treated as part of one module: `variable` defaults and `locals` from all
//! files are collected first, then `resource` blocks of mapped types and
//! `module` blocks become entities.
//!
//! ```hcl
//! resource "aws_instance" "web" {
//!   for_each   = var.web_ips
//!   private_ip = each.value
//!   depends_on = [module.db]
//! }
//! ```
//!
//! `for_each` over an object or a list of strings expands a block into one
//! entity per key, named `label[key]`. Attribute expressions are evaluated
//! with `var`, `local` and `each` in scope; expressions that need anything
//! else (other resources, data sources, functions) are ignored. Each name
//! referenced in `depends_on` becomes a dependency.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use hcl::eval::{Context, Evaluate};
use hcl::expr::{Expression, TraversalOperator};
use hcl::structure::{Block, Body};
use hcl::{Map, Value};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use drdocer_metadata::{AttributeRegistry, Entity};
use drdocer_shared::{AppConfig, DrDocerError, EntityType, Result, TerraformSourceConfig};

use crate::EntitySource;
use crate::collection::EntityCollection;
use crate::schemas::BuiltinSchemas;

const TERRAFORM_EXTENSION: &str = "tf";

/// Attributes read as the entity's IP address, first match wins.
const IP_ADDRESS_KEYS: [&str; 3] = ["ip_address", "private_ip", "public_ip"];

/// Discovers entities from Terraform `resource` and `module` blocks.
#[derive(Debug)]
pub struct TerraformSource {
    directory: PathBuf,
    priority: i32,
    resource_mappers: BTreeMap<String, EntityType>,
    module_entity_type: Option<EntityType>,
    schemas: BuiltinSchemas,
}

/// Variable defaults and locals visible to every block.
#[derive(Debug, Default)]
struct ModuleScope {
    variables: Map<String, Value>,
    locals: Map<String, Value>,
}

impl ModuleScope {
    fn context(&self, each: Option<&Value>) -> Context<'static> {
        let mut ctx = Context::new();
        ctx.declare_var("var", Value::Object(self.variables.clone()));
        ctx.declare_var("local", Value::Object(self.locals.clone()));
        if let Some(each) = each {
            ctx.declare_var("each", each.clone());
        }
        ctx
    }
}

/// One `resource` or `module` block after `for_each` expansion.
#[derive(Debug)]
struct Instance {
    name: String,
    attributes: BTreeMap<String, Value>,
    depends_on: Vec<String>,
}

impl TerraformSource {
    /// Create a source over `config.directory`, which must be an existing
    /// directory.
    pub fn new(config: &TerraformSourceConfig, registry: &AttributeRegistry) -> Result<Self> {
        let directory = PathBuf::from(&config.directory);
        let metadata = std::fs::metadata(&directory).map_err(|e| {
            DrDocerError::config(format!(
                "terraform directory {} is not accessible: {e}",
                directory.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(DrDocerError::config(format!(
                "terraform directory {} is not a directory",
                directory.display()
            )));
        }

        Ok(Self {
            directory,
            priority: config.priority,
            resource_mappers: config
                .resource_mappers
                .iter()
                .map(|(resource, kind)| (resource.clone(), EntityType::new(kind.as_str())))
                .collect(),
            module_entity_type: Some(config.module_entity_type.as_str())
                .filter(|kind| !kind.is_empty())
                .map(EntityType::from),
            schemas: BuiltinSchemas::resolve(registry)?,
        })
    }

    /// Create the source from the `[terraform]` section of the app config.
    pub fn from_app_config(config: &AppConfig, registry: &AttributeRegistry) -> Result<Self> {
        let section = config
            .terraform
            .as_ref()
            .ok_or_else(|| DrDocerError::NilConfig("[terraform] section is missing".into()))?;
        Self::new(section, registry)
    }

    /// Parse every `*.tf` file under the directory, sorted by path. A file
    /// that is not valid HCL aborts the source.
    fn parse_files(&self) -> Result<Vec<(PathBuf, Body)>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.directory).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.directory.clone());
                DrDocerError::io(path, e.into())
            })?;
            let is_terraform = entry.file_type().is_file()
                && entry.path().extension().and_then(|ext| ext.to_str())
                    == Some(TERRAFORM_EXTENSION);
            if !is_terraform {
                continue;
            }

            let path = entry.into_path();
            let content = std::fs::read_to_string(&path).map_err(|e| DrDocerError::io(&path, e))?;
            let body = hcl::parse(&content)
                .map_err(|e| DrDocerError::parse(format!("{}: {e}", path.display())))?;
            files.push((path, body));
        }
        Ok(files)
    }

    fn build_entity(&self, entity_type: EntityType, instance: Instance) -> Result<Entity> {
        let Instance {
            name,
            attributes,
            depends_on,
        } = instance;
        let mut entity = Entity::new(name, entity_type, self.priority);

        let ip = IP_ADDRESS_KEYS
            .iter()
            .find_map(|key| attributes.get(*key).and_then(string_value));
        if let Some(ip) = ip {
            ip.parse::<IpAddr>().map_err(|e| {
                DrDocerError::validation(format!("invalid ip address {ip:?}: {e}"))
            })?;
            entity.set_attribute(&self.schemas.ip_address, ip.into())?;
        }

        if let Some(url) = attributes.get("url").and_then(string_value) {
            url::Url::parse(url)
                .map_err(|e| DrDocerError::validation(format!("invalid url {url:?}: {e}")))?;
            entity.set_attribute(&self.schemas.url, url.into())?;
        }

        let host = attributes
            .get("host")
            .and_then(string_value)
            .filter(|host| !host.is_empty());
        if let Some(host) = host {
            entity.set_attribute(&self.schemas.host, host.into())?;
        }
        if let Some(description) = attributes.get("description").and_then(string_value) {
            entity.set_attribute(&self.schemas.description, description.into())?;
        }
        if let Some(source) = attributes.get("source").and_then(string_value) {
            entity.set_attribute(&self.schemas.source, source.into())?;
        }

        let mut dependencies: Vec<String> = Vec::new();
        let declared = attributes
            .get("dependencies")
            .map(string_list)
            .unwrap_or_default();
        for name in declared.into_iter().chain(depends_on) {
            if !name.is_empty() && !dependencies.contains(&name) {
                dependencies.push(name);
            }
        }
        if !dependencies.is_empty() {
            entity.set_attribute(&self.schemas.dependencies, dependencies.into())?;
        }

        debug!(entity = %entity.id(), attributes = entity.attribute_count(), "decoded block");
        Ok(entity)
    }

    fn add_block(
        &self,
        collection: &mut EntityCollection,
        block: &Block,
        scope: &ModuleScope,
        path: &Path,
    ) -> Result<()> {
        let labels: Vec<&str> = block.labels().iter().map(|label| label.as_str()).collect();
        let (entity_type, base_name) = match (block.identifier(), labels.as_slice()) {
            ("resource", [resource_type, name]) => match self.resource_mappers.get(*resource_type)
            {
                Some(kind) => (kind.clone(), *name),
                None => {
                    debug!(resource_type = *resource_type, name = *name, "ignoring unmapped resource type");
                    return Ok(());
                }
            },
            ("module", [name]) => match &self.module_entity_type {
                Some(kind) => (kind.clone(), *name),
                None => return Ok(()),
            },
            ("resource" | "module", _) => {
                warn!(path = %path.display(), block = block.identifier(), ?labels, "skipping block with unexpected labels");
                return Ok(());
            }
            _ => return Ok(()),
        };

        for instance in expand_block(block.body(), base_name, scope, path) {
            match self.build_entity(entity_type.clone(), instance) {
                Ok(entity) => collection.add_entity(entity)?,
                Err(e) => {
                    warn!(path = %path.display(), block = block.identifier(), error = %e, "skipping block");
                }
            }
        }
        Ok(())
    }
}

impl EntitySource for TerraformSource {
    #[instrument(skip_all, fields(dir = %self.directory.display()))]
    fn get_entities(&self, collection: &mut EntityCollection) -> Result<()> {
        let files = self.parse_files()?;
        info!(files = files.len(), "scanning terraform files");

        let scope = collect_scope(&files);
        for (path, body) in &files {
            for block in body.blocks() {
                self.add_block(collection, block, &scope, path)?;
            }
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        "terraform"
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Gather variable defaults, then locals in declaration order. A local may
/// refer to variables and to locals declared before it.
fn collect_scope(files: &[(PathBuf, Body)]) -> ModuleScope {
    let mut scope = ModuleScope::default();
    let literal = Context::new();

    for (path, body) in files {
        for block in body.blocks().filter(|b| b.identifier() == "variable") {
            let Some(name) = block.labels().first() else {
                continue;
            };
            let Some(default) = block.body().attributes().find(|a| a.key() == "default") else {
                continue;
            };
            match default.expr().evaluate(&literal) {
                Ok(value) => {
                    scope.variables.insert(name.as_str().to_string(), value);
                }
                Err(e) => {
                    debug!(path = %path.display(), variable = name.as_str(), error = %e, "variable default not evaluated");
                }
            }
        }
    }

    for (path, body) in files {
        for block in body.blocks().filter(|b| b.identifier() == "locals") {
            for attribute in block.body().attributes() {
                let ctx = scope.context(None);
                match attribute.expr().evaluate(&ctx) {
                    Ok(value) => {
                        scope.locals.insert(attribute.key().to_string(), value);
                    }
                    Err(e) => {
                        debug!(path = %path.display(), local = attribute.key(), error = %e, "local not evaluated");
                    }
                }
            }
        }
    }

    scope
}

/// Evaluate a block body once, or once per `for_each` key.
fn expand_block(body: &Body, base_name: &str, scope: &ModuleScope, path: &Path) -> Vec<Instance> {
    let depends_on = body
        .attributes()
        .find(|a| a.key() == "depends_on")
        .map(|a| reference_names(a.expr()))
        .unwrap_or_default();

    let Some(for_each) = body.attributes().find(|a| a.key() == "for_each") else {
        return vec![evaluate_instance(
            body,
            base_name.to_string(),
            scope,
            None,
            depends_on,
        )];
    };

    let keys: Vec<(String, Value)> = match for_each.expr().evaluate(&scope.context(None)) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(key) => Some((key.clone(), Value::String(key))),
                _ => None,
            })
            .collect(),
        Ok(other) => {
            warn!(path = %path.display(), block = base_name, value = ?other, "for_each is not an object or list");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), block = base_name, error = %e, "for_each not evaluated");
            return Vec::new();
        }
    };

    keys.into_iter()
        .map(|(key, value)| {
            let mut each = Map::new();
            each.insert("key".to_string(), Value::String(key.clone()));
            each.insert("value".to_string(), value);
            evaluate_instance(
                body,
                format!("{base_name}[{key}]"),
                scope,
                Some(&Value::Object(each)),
                depends_on.clone(),
            )
        })
        .collect()
}

fn evaluate_instance(
    body: &Body,
    name: String,
    scope: &ModuleScope,
    each: Option<&Value>,
    depends_on: Vec<String>,
) -> Instance {
    let ctx = scope.context(each);
    let mut attributes = BTreeMap::new();
    for attribute in body.attributes() {
        let key = attribute.key();
        if key == "for_each" || key == "depends_on" {
            continue;
        }
        match attribute.expr().evaluate(&ctx) {
            Ok(value) => {
                attributes.insert(key.to_string(), value);
            }
            Err(e) => {
                debug!(entity = %name, attribute = key, error = %e, "attribute not evaluated");
            }
        }
    }
    Instance {
        name,
        attributes,
        depends_on,
    }
}

/// Final name segment of each reference in a `depends_on` list:
/// `aws_instance.db` and `module.db` both yield `db`.
fn reference_names(expr: &Expression) -> Vec<String> {
    let Expression::Array(items) = expr else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Expression::Traversal(traversal) => {
                traversal
                    .operators
                    .iter()
                    .rev()
                    .find_map(|operator| match operator {
                        TraversalOperator::GetAttr(ident) => Some(ident.to_string()),
                        _ => None,
                    })
            }
            Expression::String(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn string_value(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| string_value(item).map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

//! Document generation for DrDocer.
//!
//! Each entity type has one Markdown template (handlebars syntax, YAML front
//! matter naming the type). [`DocumentGenerator`] renders an entity together
//! with its relationship edges and passes the bytes to a [`DocumentStorage`].

pub mod context;
pub mod generator;
pub mod storage;
pub mod template;

pub use context::TemplateContext;
pub use generator::DocumentGenerator;
pub use storage::DocumentStorage;
pub use template::{DocumentTemplate, TemplateMetadata, load_templates};

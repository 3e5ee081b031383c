//! Persistence backends for DrDocer.
//!
//! - [`FilesystemDocumentStorage`]: `<output>/<type>/<name>.md` plus a
//!   `manifest.json` describing the run
//! - [`StdoutDocumentStorage`]: prints documents instead of writing them
//! - [`JsonRelationshipStore`]: relationship graph kept in a JSON file
//!
//! Every file is written to a temporary sibling first and renamed into place.

mod atomic;
mod documents;
mod json_store;

pub use documents::{FilesystemDocumentStorage, MANIFEST_FILE_NAME, StdoutDocumentStorage};
pub use json_store::JsonRelationshipStore;

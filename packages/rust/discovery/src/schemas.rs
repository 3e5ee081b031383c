//! Built-in attribute schemas resolved once per source.

use std::sync::Arc;

use drdocer_metadata::{
    ATTRIBUTE_DEPENDENCIES, ATTRIBUTE_DESCRIPTION, ATTRIBUTE_HOST, ATTRIBUTE_IP_ADDRESS,
    ATTRIBUTE_SOURCE, ATTRIBUTE_URL, Attribute, AttributeRegistry,
};
use drdocer_shared::Result;

#[derive(Debug, Clone)]
pub(crate) struct BuiltinSchemas {
    pub url: Arc<Attribute>,
    pub ip_address: Arc<Attribute>,
    pub host: Arc<Attribute>,
    pub dependencies: Arc<Attribute>,
    pub description: Arc<Attribute>,
    pub source: Arc<Attribute>,
}

impl BuiltinSchemas {
    pub fn resolve(registry: &AttributeRegistry) -> Result<Self> {
        Ok(Self {
            url: registry.schema(ATTRIBUTE_URL)?,
            ip_address: registry.schema(ATTRIBUTE_IP_ADDRESS)?,
            host: registry.schema(ATTRIBUTE_HOST)?,
            dependencies: registry.schema(ATTRIBUTE_DEPENDENCIES)?,
            description: registry.schema(ATTRIBUTE_DESCRIPTION)?,
            source: registry.schema(ATTRIBUTE_SOURCE)?,
        })
    }
}

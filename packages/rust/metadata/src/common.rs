//! Built-in attribute schemas shared by the bundled sources and templates.

use drdocer_shared::Result;

use crate::attribute::{Attribute, AttributeRegistry, AttributeValue, ValueType};

pub const ATTRIBUTE_URL: &str = "url";
pub const ATTRIBUTE_IP_ADDRESS: &str = "ip_address";
/// Name of the entity hosting this one.
pub const ATTRIBUTE_HOST: &str = "host";
/// Names of the entities this one depends on.
pub const ATTRIBUTE_DEPENDENCIES: &str = "dependencies";
pub const ATTRIBUTE_DESCRIPTION: &str = "description";
/// Where an entity was declared from, e.g. a Terraform module source.
pub const ATTRIBUTE_SOURCE: &str = "source";

/// Schemas registered by [`AttributeRegistry::builtin`].
pub fn builtin_attributes() -> Result<Vec<Attribute>> {
    Ok(vec![
        Attribute::new(ATTRIBUTE_URL, ValueType::String, "".into())?,
        Attribute::new(ATTRIBUTE_IP_ADDRESS, ValueType::String, "".into())?,
        Attribute::new(ATTRIBUTE_HOST, ValueType::String, "".into())?,
        Attribute::new(
            ATTRIBUTE_DEPENDENCIES,
            ValueType::List,
            AttributeValue::List(Vec::new()),
        )?,
        Attribute::new(ATTRIBUTE_DESCRIPTION, ValueType::String, "".into())?,
        Attribute::new(ATTRIBUTE_SOURCE, ValueType::String, "".into())?,
    ])
}

impl AttributeRegistry {
    /// A registry holding the built-in schemas.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for attribute in builtin_attributes()? {
            registry.register(attribute)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_schemas() {
        let registry = AttributeRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.schema(ATTRIBUTE_DEPENDENCIES).unwrap().value_type(),
            ValueType::List
        );
        assert_eq!(
            registry.schema(ATTRIBUTE_URL).unwrap().value_type(),
            ValueType::String
        );
    }

    #[test]
    fn builtin_registries_are_independent() {
        let mut first = AttributeRegistry::builtin().unwrap();
        let second = AttributeRegistry::builtin().unwrap();
        first
            .register(Attribute::new("owner", ValueType::String, "".into()).unwrap())
            .unwrap();
        assert!(first.get("owner").is_some());
        assert!(second.get("owner").is_none());
    }
}

//! Attribute schemas, typed values and prioritised instances.
//!
//! Priority runs from negative (fallback / unknown) through 0 (baseline) to
//! any positive value; a higher priority wins a merge strictly.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drdocer_shared::{DrDocerError, Result};

/// Priority assigned to freshly created instances.
pub const BASELINE_PRIORITY: i32 = 0;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Tag describing which variant of [`AttributeValue`] a schema accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Bool,
    List,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// A concrete attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
            Self::List(_) => ValueType::List,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::String).collect())
    }
}

// ---------------------------------------------------------------------------
// Attribute schema
// ---------------------------------------------------------------------------

/// Definition of a named fact an entity may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value_type: ValueType,
    default_value: AttributeValue,
}

impl Attribute {
    /// Define a schema. The default value must match `value_type`.
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        default_value: AttributeValue,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DrDocerError::validation("attribute name must not be empty"));
        }
        check_type(&name, value_type, &default_value)?;
        Ok(Self {
            name,
            value_type,
            default_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> &AttributeValue {
        &self.default_value
    }

    /// New instance carrying the default value at baseline priority.
    pub fn create_instance(self: &Arc<Self>) -> AttributeInstance {
        AttributeInstance {
            schema: Arc::clone(self),
            value: self.default_value.clone(),
            priority: BASELINE_PRIORITY,
        }
    }

    /// Fail with `TypeMismatch` unless `value` fits this schema.
    pub fn check(&self, value: &AttributeValue) -> Result<()> {
        check_type(&self.name, self.value_type, value)
    }
}

fn check_type(name: &str, expected: ValueType, value: &AttributeValue) -> Result<()> {
    let actual = value.value_type();
    if actual != expected {
        return Err(DrDocerError::TypeMismatch {
            attribute: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Attribute instance
// ---------------------------------------------------------------------------

/// A value of a schema attached to one entity, tagged with a priority.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInstance {
    schema: Arc<Attribute>,
    value: AttributeValue,
    priority: i32,
}

impl AttributeInstance {
    pub fn schema(&self) -> &Arc<Attribute> {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Assign a new value; priority is left untouched.
    pub fn set_value(&mut self, value: AttributeValue) -> Result<()> {
        self.schema.check(&value)?;
        self.value = value;
        Ok(())
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Take `incoming`'s value and priority if it belongs to the same schema
    /// and has a strictly higher priority. Ties keep the current value.
    pub fn merge_attribute(&mut self, incoming: Option<&AttributeInstance>) {
        let Some(incoming) = incoming else {
            return;
        };
        if self.schema != incoming.schema {
            return;
        }
        if incoming.priority <= self.priority {
            return;
        }
        self.value = incoming.value.clone();
        self.priority = incoming.priority;
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Set of known schemas, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    attributes: BTreeMap<String, Arc<Attribute>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Names are unique across the registry.
    pub fn register(&mut self, attribute: Attribute) -> Result<Arc<Attribute>> {
        let name = attribute.name().to_string();
        if self.attributes.contains_key(&name) {
            return Err(DrDocerError::validation(format!(
                "attribute {name} already registered"
            )));
        }
        let attribute = Arc::new(attribute);
        self.attributes.insert(name, Arc::clone(&attribute));
        Ok(attribute)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Attribute>> {
        self.attributes.get(name).cloned()
    }

    /// Like [`get`](Self::get) but fails with `UnknownAttribute`.
    pub fn schema(&self, name: &str) -> Result<Arc<Attribute>> {
        self.get(name)
            .ok_or_else(|| DrDocerError::UnknownAttribute(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.attributes.values()
    }
}

//! Attribute schemas, prioritised attribute instances and the attribute-bag
//! [`Entity`] for DrDocer.
//!
//! Entities from different sources describing the same `(name, type)` are
//! reconciled with [`Entity::merge_attributes`]: a fact replaces another only
//! when its priority is strictly higher.

pub mod attribute;
pub mod common;
pub mod entity;

pub use attribute::{
    Attribute, AttributeInstance, AttributeRegistry, AttributeValue, BASELINE_PRIORITY, ValueType,
};
pub use common::{
    ATTRIBUTE_DEPENDENCIES, ATTRIBUTE_DESCRIPTION, ATTRIBUTE_HOST, ATTRIBUTE_IP_ADDRESS,
    ATTRIBUTE_SOURCE, ATTRIBUTE_URL,
};
pub use entity::Entity;

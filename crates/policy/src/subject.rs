//! Subjects of a permission check and structural type inference.
//!
//! Call sites that build an instance themselves should tag it with
//! [`Instance::new`]. Attribute bags arriving untyped go through
//! [`classify`], which infers a [`ResourceType`] from the bag's shape.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ResourceType;

/// Attribute that carries an explicit resource type for untyped bags.
pub const TYPE_HINT_FIELD: &str = "__type";

/// Infer the resource type of an untyped attribute bag.
///
/// Checked in a fixed order, first match wins:
///
/// 1. an explicit [`TYPE_HINT_FIELD`], trusted verbatim
/// 2. `public` or `adminOnly` present: `Resource`
/// 3. `promptType` present: `Prompt`
/// 4. `userId` present without `email`: `MCP`
/// 5. otherwise `User`
///
/// Returns `None` only when the hint names a type that does not exist.
pub fn classify(attrs: &Map<String, Value>) -> Option<ResourceType> {
    if let Some(hint) = attrs.get(TYPE_HINT_FIELD) {
        return hint.as_str().and_then(|s| s.parse().ok());
    }
    if attrs.contains_key("public") || attrs.contains_key("adminOnly") {
        return Some(ResourceType::Resource);
    }
    if attrs.contains_key("promptType") {
        return Some(ResourceType::Prompt);
    }
    if attrs.contains_key("userId") && !attrs.contains_key("email") {
        return Some(ResourceType::Mcp);
    }
    Some(ResourceType::User)
}

/// A concrete, typed object presented for an instance-level check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    resource: ResourceType,
    attrs: Map<String, Value>,
}

impl Instance {
    /// Create an instance with an explicit type tag.
    pub fn new(resource: ResourceType, attrs: Map<String, Value>) -> Self {
        Self { resource, attrs }
    }

    /// Create an instance with no attributes.
    pub fn empty(resource: ResourceType) -> Self {
        Self::new(resource, Map::new())
    }

    /// Type an attribute bag by its shape. See [`classify`].
    pub fn classify(mut attrs: Map<String, Value>) -> Option<Self> {
        let resource = classify(&attrs)?;
        attrs.remove(TYPE_HINT_FIELD);
        Some(Self { resource, attrs })
    }

    /// Type an arbitrary JSON value. Non-objects are never instances.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(attrs) => Self::classify(attrs),
            _ => None,
        }
    }

    /// Add an attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// What a check is asked about: a whole resource type or one instance of it.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Type(ResourceType),
    Instance(Instance),
}

impl Subject {
    pub fn resource(&self) -> ResourceType {
        match self {
            Subject::Type(r) => *r,
            Subject::Instance(i) => i.resource(),
        }
    }
}

impl From<ResourceType> for Subject {
    fn from(resource: ResourceType) -> Self {
        Subject::Type(resource)
    }
}

impl From<Instance> for Subject {
    fn from(instance: Instance) -> Self {
        Subject::Instance(instance)
    }
}

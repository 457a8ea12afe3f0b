use serde_json::Value;
use uuid::Uuid;

use crate::model::{Attrs, NodeType};

/// A node in the IR representing a geometric or semantic entity.
///
/// `id` and `node_type` are fixed at construction; `attrs` stays mutable
/// until the owning IR is serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    node_type: NodeType,
    pub attrs: Attrs,
}

impl Node {
    /// Create a node, generating an id when `id` is empty and injecting a
    /// placeholder `name` for container kinds that lack one.
    pub fn new(id: impl Into<String>, node_type: NodeType, attrs: Attrs) -> Self {
        let mut id = id.into();
        if id.is_empty() {
            id = Uuid::new_v4().to_string();
        }

        let mut attrs = attrs;
        if node_type.is_container() && !attrs.contains_key("name") {
            let short: String = id.chars().take(8).collect();
            attrs.insert(
                "name".to_string(),
                Value::String(format!("Unnamed_{}_{}", node_type.as_str(), short)),
            );
        }

        Self { id, node_type, attrs }
    }

    /// Create a node with no attributes.
    pub fn bare(id: impl Into<String>, node_type: NodeType) -> Self {
        Self::new(id, node_type, Attrs::new())
    }

    /// Assembly node with standard `name` / `description` attributes.
    pub fn assembly(name: &str, id: Option<String>) -> Self {
        Self::container(NodeType::Assembly, "Assembly", name, id)
    }

    /// Part node with standard `name` / `description` attributes.
    pub fn part(name: &str, id: Option<String>) -> Self {
        Self::container(NodeType::Part, "Part", name, id)
    }

    /// Unit node (`unit_type` = "length", `value` = "mm", ...).
    pub fn unit(unit_type: &str, value: &str, id: Option<String>) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert("unit_type".to_string(), Value::String(unit_type.to_string()));
        attrs.insert("value".to_string(), Value::String(value.to_string()));
        Self::new(id.unwrap_or_default(), NodeType::Unit, attrs)
    }

    fn container(node_type: NodeType, label: &str, name: &str, id: Option<String>) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert("name".to_string(), Value::String(name.to_string()));
        attrs.insert("description".to_string(), Value::String(format!("{label}: {name}")));
        Self::new(id.unwrap_or_default(), node_type, attrs)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Builder-style helper to set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Convenience accessor for the `name` attribute when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.attrs.get("name").and_then(Value::as_str)
    }
}

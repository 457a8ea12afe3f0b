use serde_json::Value;

use crate::model::{Attrs, EdgeType, GraphError};

/// A typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    src: String,
    dst: String,
    edge_type: EdgeType,
    pub attrs: Attrs,
}

impl Edge {
    /// Create an edge. Empty endpoints and self-loops are always rejected,
    /// whatever the edge type.
    pub fn new(
        src: impl Into<String>,
        dst: impl Into<String>,
        edge_type: EdgeType,
    ) -> Result<Self, GraphError> {
        Self::with_attrs(src, dst, edge_type, Attrs::new())
    }

    pub fn with_attrs(
        src: impl Into<String>,
        dst: impl Into<String>,
        edge_type: EdgeType,
        attrs: Attrs,
    ) -> Result<Self, GraphError> {
        let edge = Self::unchecked(src.into(), dst.into(), edge_type, attrs);
        edge.check()?;
        Ok(edge)
    }

    /// Build an edge without enforcing endpoint rules. Only the decoder uses
    /// this, so persisted data with bad edges stays inspectable.
    pub(crate) fn unchecked(src: String, dst: String, edge_type: EdgeType, attrs: Attrs) -> Self {
        Self { src, dst, edge_type, attrs }
    }

    /// Endpoint rules shared by construction and IR validation.
    pub(crate) fn check(&self) -> Result<(), GraphError> {
        if self.src.is_empty() || self.dst.is_empty() {
            return Err(GraphError::EmptyEndpoint);
        }
        if self.src == self.dst {
            return Err(GraphError::SelfLoop(self.src.clone()));
        }
        Ok(())
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn edge_type(&self) -> &EdgeType {
        &self.edge_type
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of entity a node represents.
///
/// Unknown names survive a decode/encode cycle through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    // Top-level containers
    Assembly,
    Part,
    Product,

    // B-rep topology
    ManifoldSolidBrep,
    AdvancedFace,
    EdgeCurve,
    VertexPoint,

    // Units and coordinate systems
    Unit,
    CoordinateSystem,

    // Product manufacturing information
    PmiEntity,
    GeometricTolerance,
    DimensioningTolerance,

    // Properties
    ValidationProperty,
    MaterialProperty,
    SurfaceFinish,

    Other(String),
}

impl NodeType {
    /// Name as written in IR documents.
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Assembly => "Assembly",
            NodeType::Part => "Part",
            NodeType::Product => "Product",
            NodeType::ManifoldSolidBrep => "ManifoldSolidBrep",
            NodeType::AdvancedFace => "AdvancedFace",
            NodeType::EdgeCurve => "EdgeCurve",
            NodeType::VertexPoint => "VertexPoint",
            NodeType::Unit => "Unit",
            NodeType::CoordinateSystem => "CoordinateSystem",
            NodeType::PmiEntity => "PMI_Entity",
            NodeType::GeometricTolerance => "GeometricTolerance",
            NodeType::DimensioningTolerance => "DimensioningTolerance",
            NodeType::ValidationProperty => "ValidationProperty",
            NodeType::MaterialProperty => "MaterialProperty",
            NodeType::SurfaceFinish => "SurfaceFinish",
            NodeType::Other(name) => name,
        }
    }

    /// Position in the canonical node order. Containers come first, unknown
    /// kinds last.
    pub fn priority(&self) -> u32 {
        match self {
            NodeType::Assembly => 0,
            NodeType::Part => 1,
            NodeType::Product => 2,
            NodeType::ManifoldSolidBrep => 10,
            NodeType::AdvancedFace => 11,
            NodeType::EdgeCurve => 12,
            NodeType::VertexPoint => 13,
            NodeType::Unit => 20,
            NodeType::CoordinateSystem => 21,
            NodeType::PmiEntity => 30,
            NodeType::GeometricTolerance => 31,
            NodeType::DimensioningTolerance => 32,
            NodeType::ValidationProperty => 40,
            NodeType::MaterialProperty => 41,
            NodeType::SurfaceFinish => 42,
            NodeType::Other(_) => 999,
        }
    }

    /// Whether this kind is a top-level container that must carry a `name`.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeType::Assembly | NodeType::Part | NodeType::Product)
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        match value {
            "Assembly" => NodeType::Assembly,
            "Part" => NodeType::Part,
            "Product" => NodeType::Product,
            "ManifoldSolidBrep" => NodeType::ManifoldSolidBrep,
            "AdvancedFace" => NodeType::AdvancedFace,
            "EdgeCurve" => NodeType::EdgeCurve,
            "VertexPoint" => NodeType::VertexPoint,
            "Unit" => NodeType::Unit,
            "CoordinateSystem" => NodeType::CoordinateSystem,
            "PMI_Entity" => NodeType::PmiEntity,
            "GeometricTolerance" => NodeType::GeometricTolerance,
            "DimensioningTolerance" => NodeType::DimensioningTolerance,
            "ValidationProperty" => NodeType::ValidationProperty,
            "MaterialProperty" => NodeType::MaterialProperty,
            "SurfaceFinish" => NodeType::SurfaceFinish,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        NodeType::from(value.as_str())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of relationship an edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    // Hierarchy
    Contains,
    PartOf,
    InstanceOf,

    // Topology
    BoundedBy,
    AdjacentTo,
    SharesEdge,
    SharesVertex,

    // Semantics
    HasPmi,
    HasMaterial,
    HasTolerance,
    References,

    // Units and coordinate systems
    MeasuredIn,
    CoordinateSystem,

    Other(String),
}

impl EdgeType {
    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Contains => "contains",
            EdgeType::PartOf => "part_of",
            EdgeType::InstanceOf => "instance_of",
            EdgeType::BoundedBy => "bounded_by",
            EdgeType::AdjacentTo => "adjacent_to",
            EdgeType::SharesEdge => "shares_edge",
            EdgeType::SharesVertex => "shares_vertex",
            EdgeType::HasPmi => "has_pmi",
            EdgeType::HasMaterial => "has_material",
            EdgeType::HasTolerance => "has_tolerance",
            EdgeType::References => "references",
            EdgeType::MeasuredIn => "measured_in",
            EdgeType::CoordinateSystem => "coordinate_system",
            EdgeType::Other(name) => name,
        }
    }
}

impl From<&str> for EdgeType {
    fn from(value: &str) -> Self {
        match value {
            "contains" => EdgeType::Contains,
            "part_of" => EdgeType::PartOf,
            "instance_of" => EdgeType::InstanceOf,
            "bounded_by" => EdgeType::BoundedBy,
            "adjacent_to" => EdgeType::AdjacentTo,
            "shares_edge" => EdgeType::SharesEdge,
            "shares_vertex" => EdgeType::SharesVertex,
            "has_pmi" => EdgeType::HasPmi,
            "has_material" => EdgeType::HasMaterial,
            "has_tolerance" => EdgeType::HasTolerance,
            "references" => EdgeType::References,
            "measured_in" => EdgeType::MeasuredIn,
            "coordinate_system" => EdgeType::CoordinateSystem,
            other => EdgeType::Other(other.to_string()),
        }
    }
}

impl From<String> for EdgeType {
    fn from(value: String) -> Self {
        EdgeType::from(value.as_str())
    }
}

impl From<EdgeType> for String {
    fn from(value: EdgeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_round_trip_through_strings() {
        for name in ["Assembly", "PMI_Entity", "SurfaceFinish", "VertexPoint"] {
            assert_eq!(NodeType::from(name).as_str(), name);
        }
        for name in ["contains", "shares_vertex", "coordinate_system"] {
            assert_eq!(EdgeType::from(name).as_str(), name);
        }
    }

    #[test]
    fn unknown_node_type_sorts_last() {
        let other = NodeType::from("Spline");
        assert_eq!(other, NodeType::Other("Spline".into()));
        assert_eq!(other.priority(), 999);
        assert!(NodeType::SurfaceFinish.priority() < other.priority());
    }
}

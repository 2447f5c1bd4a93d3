//! Graph store contract and the handle types it hands out

use crate::error::StoreError;
use crate::query::{self, Step};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Result type for store primitives
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Opaque, store-owned vertex handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u64);

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VertexId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Edge direction, relative to a source vertex or source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Out,
    In,
    Both,
}

impl Direction {
    /// The same edge seen from the other end
    pub fn reverse(self) -> Self {
        match self {
            Self::Out => Self::In,
            Self::In => Self::Out,
            Self::Both => Self::Both,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Out => "OUT",
            Self::In => "IN",
            Self::Both => "BOTH",
        };
        f.write_str(s)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" | "outgoing" => Ok(Self::Out),
            "in" | "incoming" => Ok(Self::In),
            "both" => Ok(Self::Both),
            other => Err(format!("invalid direction: {other} (expected out, in or both)")),
        }
    }
}

/// Flags stamped on every stored edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeFlags {
    /// Parent/child ownership edge, pointing from parent to child
    #[serde(default)]
    pub containment: bool,

    /// Deleting the out vertex makes the in vertex deletable
    #[serde(default, rename = "cascade-delete")]
    pub cascade_delete: bool,
}

/// A vertex as read through the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,

    /// Entity type name of this vertex
    #[serde(rename = "node-type")]
    pub node_type: String,

    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Vertex {
    pub fn new(id: VertexId, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Compare a property against its string rendering
    pub fn property_matches(&self, key: &str, expected: &str) -> bool {
        match self.properties.get(key) {
            Some(serde_json::Value::String(s)) => s == expected,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == expected,
        }
    }
}

/// A directed, labeled edge as read through the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub out_vertex: VertexId,
    pub in_vertex: VertexId,
    pub label: String,
    #[serde(flatten)]
    pub flags: EdgeFlags,
}

impl Edge {
    /// The endpoint opposite `from`
    pub fn other(&self, from: VertexId) -> VertexId {
        if self.out_vertex == from {
            self.in_vertex
        } else {
            self.out_vertex
        }
    }
}

/// Read access to an external graph store.
///
/// Implementations own every vertex and edge; callers only hold ids for the
/// duration of a call. Any failure is returned as a [`StoreError`] and is
/// surfaced to the caller without retry.
pub trait GraphStore: Send + Sync {
    /// Look up a vertex by id
    fn vertex(&self, id: VertexId) -> StoreResult<Option<Vertex>>;

    /// Ids of every vertex in the store
    fn vertex_ids(&self) -> StoreResult<Vec<VertexId>>;

    /// Edges incident to `id` in `direction`, optionally restricted to a label
    fn edges(&self, id: VertexId, direction: Direction, label: Option<&str>) -> StoreResult<Vec<Edge>>;

    /// Run a traversal expression, anchored at `start` or across all vertices.
    ///
    /// The default walks the steps with [`GraphStore::edges`]; stores with a
    /// native query language can override it.
    fn run_steps(&self, start: Option<VertexId>, steps: &[Step]) -> StoreResult<Vec<VertexId>> {
        query::evaluate(self, start, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_reverse() {
        assert_eq!(Direction::Out.reverse(), Direction::In);
        assert_eq!(Direction::In.reverse(), Direction::Out);
        assert_eq!(Direction::Both.reverse(), Direction::Both);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("OUT".parse::<Direction>().unwrap(), Direction::Out);
        assert_eq!("incoming".parse::<Direction>().unwrap(), Direction::In);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_property_matches() {
        let v = Vertex::new(VertexId(1), "pserver")
            .with_property("hostname", "h1")
            .with_property("number-of-cpus", 8);

        assert!(v.property_matches("hostname", "h1"));
        assert!(v.property_matches("number-of-cpus", "8"));
        assert!(!v.property_matches("hostname", "h2"));
        assert!(!v.property_matches("missing", "h1"));
    }

    #[test]
    fn test_edge_other() {
        let edge = Edge {
            out_vertex: VertexId(1),
            in_vertex: VertexId(2),
            label: "has".into(),
            flags: EdgeFlags::default(),
        };
        assert_eq!(edge.other(VertexId(1)), VertexId(2));
        assert_eq!(edge.other(VertexId(2)), VertexId(1));
    }
}

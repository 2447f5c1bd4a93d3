//! JSON graph snapshots for seeding a [`MemoryStore`]

use crate::error::StorageResult;
use crate::memory::MemoryStore;
use cairn_core::{EdgeFlags, EdgeRuleRegistry, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Edge as written in a snapshot
///
/// Edges without a label are stamped from the edge rule between their
/// endpoints' types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub out: VertexId,
    #[serde(rename = "in")]
    pub in_: VertexId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub flags: EdgeFlags,
}

/// A whole graph: vertices plus edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<SnapshotEdge>,
}

impl GraphSnapshot {
    pub fn from_json_str(s: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl MemoryStore {
    /// Build a store holding everything in `snapshot`
    pub fn from_snapshot(snapshot: GraphSnapshot, rules: &EdgeRuleRegistry) -> StorageResult<Self> {
        let store = Self::new();
        let vertex_count = snapshot.vertices.len();
        let edge_count = snapshot.edges.len();

        for vertex in snapshot.vertices {
            store.insert_vertex(vertex)?;
        }
        for edge in snapshot.edges {
            match edge.label {
                Some(label) => store.add_edge(edge.out, edge.in_, label, edge.flags)?,
                None => store.add_ruled_edge(rules, edge.out, edge.in_)?,
            };
        }

        tracing::debug!(
            "Loaded snapshot with {} vertices and {} edges",
            vertex_count,
            edge_count
        );
        Ok(store)
    }

    /// Load a JSON snapshot file
    pub fn load(path: impl AsRef<Path>, rules: &EdgeRuleRegistry) -> StorageResult<Self> {
        Self::from_snapshot(GraphSnapshot::load(path)?, rules)
    }
}

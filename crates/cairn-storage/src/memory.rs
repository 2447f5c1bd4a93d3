//! In-memory graph store

use crate::error::{StorageError, StorageResult};
use cairn_core::{
    Direction, Edge, EdgeFlags, EdgeRuleRegistry, GraphStore, StoreResult, Vertex, VertexId,
};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory graph store
///
/// Owns its vertices and edges; readers only ever see clones.
pub struct MemoryStore {
    vertices: RwLock<BTreeMap<VertexId, Vertex>>,
    edges: RwLock<Vec<Edge>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            vertices: RwLock::new(BTreeMap::new()),
            edges: RwLock::new(Vec::new()),
        }
    }

    /// Insert a vertex with the next free id
    pub fn add_vertex(&self, node_type: impl Into<String>) -> StorageResult<VertexId> {
        let mut vertices = self
            .vertices
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let id = match vertices.keys().next_back() {
            Some(last) => VertexId(
                last.0
                    .checked_add(1)
                    .ok_or(StorageError::IdsExhausted(*last))?,
            ),
            None => VertexId(1),
        };
        vertices.insert(id, Vertex::new(id, node_type));
        Ok(id)
    }

    /// Insert a fully built vertex under its own id
    pub fn insert_vertex(&self, vertex: Vertex) -> StorageResult<()> {
        let mut vertices = self
            .vertices
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        if vertices.contains_key(&vertex.id) {
            return Err(StorageError::DuplicateVertex(vertex.id));
        }
        vertices.insert(vertex.id, vertex);
        Ok(())
    }

    /// Set a property on an existing vertex
    pub fn set_property(
        &self,
        id: VertexId,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> StorageResult<()> {
        let mut vertices = self
            .vertices
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let vertex = vertices
            .get_mut(&id)
            .ok_or(StorageError::VertexNotFound(id))?;
        vertex.properties.insert(key.into(), value.into());
        Ok(())
    }

    /// Remove a vertex and every edge touching it
    pub fn remove_vertex(&self, id: VertexId) -> StorageResult<()> {
        {
            let mut vertices = self
                .vertices
                .write()
                .map_err(|e| StorageError::Lock(e.to_string()))?;
            if vertices.remove(&id).is_none() {
                return Err(StorageError::VertexNotFound(id));
            }
        }

        let mut edges = self
            .edges
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        edges.retain(|e| e.out_vertex != id && e.in_vertex != id);
        Ok(())
    }

    /// Add an edge with explicit label and flags
    pub fn add_edge(
        &self,
        out_vertex: VertexId,
        in_vertex: VertexId,
        label: impl Into<String>,
        flags: EdgeFlags,
    ) -> StorageResult<Edge> {
        self.require(out_vertex)?;
        self.require(in_vertex)?;

        let edge = Edge {
            out_vertex,
            in_vertex,
            label: label.into(),
            flags,
        };
        let mut edges = self
            .edges
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        edges.push(edge.clone());
        Ok(edge)
    }

    /// Add an edge between two vertices as their types' edge rule declares it.
    ///
    /// The rule decides label, flags and which end the edge leaves from; an
    /// `IN` rule from `a`'s type to `b`'s type stores the edge as `b -> a`.
    pub fn add_ruled_edge(
        &self,
        rules: &EdgeRuleRegistry,
        a: VertexId,
        b: VertexId,
    ) -> StorageResult<Edge> {
        let a_type = self.require(a)?.node_type;
        let b_type = self.require(b)?.node_type;

        let rule = rules
            .lookup(&a_type, &b_type)
            .ok_or_else(|| StorageError::MissingEdgeRule {
                from: a_type.clone(),
                to: b_type.clone(),
            })?;

        let (out_vertex, in_vertex) = match rule.direction {
            Direction::Out | Direction::Both => (a, b),
            Direction::In => (b, a),
        };
        tracing::trace!(
            "Adding {} edge {} -> {} ({} -> {})",
            rule.label,
            out_vertex,
            in_vertex,
            a_type,
            b_type
        );
        self.add_edge(out_vertex, in_vertex, rule.label.clone(), EdgeFlags::from(rule))
    }

    pub fn vertex_count(&self) -> StorageResult<usize> {
        let vertices = self
            .vertices
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(vertices.len())
    }

    pub fn edge_count(&self) -> StorageResult<usize> {
        let edges = self
            .edges
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(edges.len())
    }

    fn require(&self, id: VertexId) -> StorageResult<Vertex> {
        let vertices = self
            .vertices
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        vertices
            .get(&id)
            .cloned()
            .ok_or(StorageError::VertexNotFound(id))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemoryStore {
    fn vertex(&self, id: VertexId) -> StoreResult<Option<Vertex>> {
        let vertices = self
            .vertices
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(vertices.get(&id).cloned())
    }

    fn vertex_ids(&self) -> StoreResult<Vec<VertexId>> {
        let vertices = self
            .vertices
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(vertices.keys().copied().collect())
    }

    fn edges(
        &self,
        id: VertexId,
        direction: Direction,
        label: Option<&str>,
    ) -> StoreResult<Vec<Edge>> {
        let edges = self
            .edges
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(edges
            .iter()
            .filter(|e| label.map_or(true, |l| e.label == l))
            .filter(|e| match direction {
                Direction::Out => e.out_vertex == id,
                Direction::In => e.in_vertex == id,
                Direction::Both => e.out_vertex == id || e.in_vertex == id,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::{EdgeRule, SeedEmission, TraversalEngine, TraversalQuery};

    fn rules() -> EdgeRuleRegistry {
        EdgeRuleRegistry::from_rules(vec![
            EdgeRule::new("tenant", "vserver", "owns", Direction::Out)
                .containment()
                .cascading(),
            EdgeRule::new("vserver", "pserver", "runsOnPserver", Direction::Out),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_and_read_vertices() {
        let store = MemoryStore::new();
        let a = store.add_vertex("tenant").unwrap();
        let b = store.add_vertex("vserver").unwrap();
        assert_eq!(a, VertexId(1));
        assert_eq!(b, VertexId(2));

        store.set_property(b, "vserver-id", "v1").unwrap();
        let vertex = store.vertex(b).unwrap().unwrap();
        assert_eq!(vertex.node_type, "vserver");
        assert!(vertex.property_matches("vserver-id", "v1"));
        assert_eq!(store.vertex_ids().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_duplicate_vertex() {
        let store = MemoryStore::new();
        store.insert_vertex(Vertex::new(VertexId(5), "tenant")).unwrap();
        let err = store
            .insert_vertex(Vertex::new(VertexId(5), "tenant"))
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateVertex(VertexId(5))));
    }

    #[test]
    fn test_ids_exhausted() {
        let store = MemoryStore::new();
        store
            .insert_vertex(Vertex::new(VertexId(u64::MAX), "tenant"))
            .unwrap();
        let err = store.add_vertex("vserver").unwrap_err();
        assert!(matches!(err, StorageError::IdsExhausted(VertexId(u64::MAX))));
        assert_eq!(store.vertex_count().unwrap(), 1);
    }

    #[test]
    fn test_ruled_edge_follows_rule_direction() {
        let store = MemoryStore::new();
        let rules = rules();
        let tenant = store.add_vertex("tenant").unwrap();
        let vserver = store.add_vertex("vserver").unwrap();

        // Asked from the child's side, the edge still leaves the tenant
        let edge = store.add_ruled_edge(&rules, vserver, tenant).unwrap();
        assert_eq!(edge.out_vertex, tenant);
        assert_eq!(edge.in_vertex, vserver);
        assert_eq!(edge.label, "owns");
        assert!(edge.flags.containment);
        assert!(edge.flags.cascade_delete);
    }

    #[test]
    fn test_ruled_edge_requires_rule() {
        let store = MemoryStore::new();
        let rules = rules();
        let tenant = store.add_vertex("tenant").unwrap();
        let pserver = store.add_vertex("pserver").unwrap();

        let err = store.add_ruled_edge(&rules, tenant, pserver).unwrap_err();
        assert!(matches!(err, StorageError::MissingEdgeRule { .. }));
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn test_edge_requires_vertices() {
        let store = MemoryStore::new();
        let a = store.add_vertex("tenant").unwrap();
        let err = store
            .add_edge(a, VertexId(42), "owns", EdgeFlags::default())
            .unwrap_err();
        assert!(matches!(err, StorageError::VertexNotFound(VertexId(42))));
    }

    #[test]
    fn test_remove_vertex_drops_edges() {
        let store = MemoryStore::new();
        let rules = rules();
        let tenant = store.add_vertex("tenant").unwrap();
        let vserver = store.add_vertex("vserver").unwrap();
        store.add_ruled_edge(&rules, tenant, vserver).unwrap();

        store.remove_vertex(vserver).unwrap();
        assert_eq!(store.vertex_count().unwrap(), 1);
        assert_eq!(store.edge_count().unwrap(), 0);
        assert!(store.vertex(vserver).unwrap().is_none());
    }

    #[test]
    fn test_traversal_over_memory_store() {
        let store = MemoryStore::new();
        let rules = rules();
        let tenant = store.add_vertex("tenant").unwrap();
        let vserver = store.add_vertex("vserver").unwrap();
        let pserver = store.add_vertex("pserver").unwrap();
        store.add_ruled_edge(&rules, tenant, vserver).unwrap();
        store.add_ruled_edge(&rules, vserver, pserver).unwrap();

        let parents =
            TraversalEngine::find_parents(&store, vserver, SeedEmission::Include).unwrap();
        assert_eq!(parents, vec![vserver, tenant]);

        let deletable =
            TraversalEngine::find_deletable(&store, tenant, SeedEmission::Exclude).unwrap();
        assert_eq!(deletable, vec![vserver]);

        let query = TraversalQuery::from_vertex(vserver).out("runsOnPserver");
        let hosts = TraversalEngine::execute_query(&store, &query).unwrap();
        assert_eq!(hosts, vec![pserver]);
    }
}

//! Graph traversal over containment and delete-cascade edges

use crate::error::Result;
use crate::graph::{Direction, EdgeFlags, GraphStore, VertexId};
use crate::query::TraversalQuery;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Whether a closure lists its starting vertex
///
/// `Include` follows the emit-then-repeat convention: the seed is emitted
/// first, then everything reached from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedEmission {
    #[default]
    Include,
    Exclude,
}

impl From<bool> for SeedEmission {
    fn from(include: bool) -> Self {
        if include {
            Self::Include
        } else {
            Self::Exclude
        }
    }
}

/// Graph traversal engine
///
/// Stateless; every operation reads through the store it is handed and
/// returns store failures as they came.
pub struct TraversalEngine;

impl TraversalEngine {
    /// Every ancestor of `start`, following inbound containment edges
    pub fn find_parents<S>(store: &S, start: VertexId, seed: SeedEmission) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        Self::closure(store, start, seed, Direction::In, |flags| flags.containment)
    }

    /// Every descendant of `start`, following outbound containment edges
    pub fn find_children<S>(store: &S, start: VertexId, seed: SeedEmission) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        Self::closure(store, start, seed, Direction::Out, |flags| flags.containment)
    }

    /// Everything deleting `start` would take with it: outbound edges that
    /// are containment or cascade-delete
    pub fn find_deletable<S>(store: &S, start: VertexId, seed: SeedEmission) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        Self::closure(store, start, seed, Direction::Out, |flags| {
            flags.containment || flags.cascade_delete
        })
    }

    /// Direct neighbors across `label` edges whose node-type is `node_type`.
    ///
    /// Parallel edges to the same vertex yield it once.
    pub fn find_related_vertices<S>(
        store: &S,
        start: VertexId,
        direction: Direction,
        label: &str,
        node_type: &str,
    ) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut related = Vec::new();

        for edge in store.edges(start, direction, Some(label))? {
            let other = edge.other(start);
            if !seen.insert(other) {
                continue;
            }
            if let Some(vertex) = store.vertex(other)? {
                if vertex.node_type == node_type {
                    related.push(other);
                }
            }
        }

        tracing::debug!(
            "Found {} {} vertices related to {} via {} ({})",
            related.len(),
            node_type,
            start,
            label,
            direction
        );
        Ok(related)
    }

    /// Run a traversal expression against the store
    pub fn execute_query<S>(store: &S, query: &TraversalQuery) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        tracing::debug!(
            "Executing query: start={:?}, steps={}",
            query.start,
            query.steps.len()
        );
        Ok(store.run_steps(query.start, &query.steps)?)
    }

    /// Run only the parent part of a traversal expression
    pub fn execute_parent_query<S>(store: &S, query: &TraversalQuery) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
    {
        let steps = query.parent_steps();
        tracing::debug!(
            "Executing parent query: start={:?}, steps={}",
            query.start,
            steps.len()
        );
        Ok(store.run_steps(query.start, steps)?)
    }

    /// Breadth-first closure over edges in `direction` accepted by `follow`
    fn closure<S, F>(
        store: &S,
        start: VertexId,
        seed: SeedEmission,
        direction: Direction,
        follow: F,
    ) -> Result<Vec<VertexId>>
    where
        S: GraphStore + ?Sized,
        F: Fn(&EdgeFlags) -> bool,
    {
        if store.vertex(start)?.is_none() {
            tracing::debug!("Closure start {} not found", start);
            return Ok(Vec::new());
        }

        let mut visited: HashSet<VertexId> = HashSet::new();
        let mut queue: VecDeque<VertexId> = VecDeque::new();
        let mut discovered = Vec::new();
        let mut edges_traversed = 0usize;

        visited.insert(start);
        queue.push_back(start);
        if seed == SeedEmission::Include {
            discovered.push(start);
        }

        while let Some(current) = queue.pop_front() {
            for edge in store.edges(current, direction, None)? {
                edges_traversed += 1;
                if !follow(&edge.flags) {
                    continue;
                }

                let next = edge.other(current);
                if visited.insert(next) {
                    discovered.push(next);
                    queue.push_back(next);
                }
            }
        }

        tracing::debug!(
            "Closure from {} ({}) reached {} vertices over {} edges",
            start,
            direction,
            discovered.len(),
            edges_traversed
        );
        Ok(discovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, StoreError};
    use crate::graph::{Edge, StoreResult, Vertex};

    #[derive(Default)]
    struct TestGraph {
        vertices: Vec<Vertex>,
        edges: Vec<Edge>,
    }

    impl TestGraph {
        fn with_vertex(mut self, id: u64, node_type: &str) -> Self {
            self.vertices.push(Vertex::new(VertexId(id), node_type));
            self
        }

        fn with_edge(mut self, out: u64, inn: u64, label: &str, containment: bool, cascade: bool) -> Self {
            self.edges.push(Edge {
                out_vertex: VertexId(out),
                in_vertex: VertexId(inn),
                label: label.to_string(),
                flags: EdgeFlags {
                    containment,
                    cascade_delete: cascade,
                },
            });
            self
        }
    }

    impl GraphStore for TestGraph {
        fn vertex(&self, id: VertexId) -> StoreResult<Option<Vertex>> {
            Ok(self.vertices.iter().find(|v| v.id == id).cloned())
        }

        fn vertex_ids(&self) -> StoreResult<Vec<VertexId>> {
            Ok(self.vertices.iter().map(|v| v.id).collect())
        }

        fn edges(&self, id: VertexId, direction: Direction, label: Option<&str>) -> StoreResult<Vec<Edge>> {
            Ok(self
                .edges
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

    struct UnreachableStore;

    impl GraphStore for UnreachableStore {
        fn vertex(&self, _id: VertexId) -> StoreResult<Option<Vertex>> {
            Err(StoreError::new("store unreachable"))
        }

        fn vertex_ids(&self) -> StoreResult<Vec<VertexId>> {
            Err(StoreError::new("store unreachable"))
        }

        fn edges(&self, _id: VertexId, _d: Direction, _l: Option<&str>) -> StoreResult<Vec<Edge>> {
            Err(StoreError::new("store unreachable"))
        }
    }

    // cloud-region(1) -has-> tenant(2) -owns-> vserver(3), vserver(7)
    // vserver(3) -uses (cascade)-> volume(4)
    // vserver(3) -runsOn (plain, twice)-> pserver(5)
    // complex(6) -locatedIn-> pserver(5)
    fn inventory() -> TestGraph {
        TestGraph::default()
            .with_vertex(1, "cloud-region")
            .with_vertex(2, "tenant")
            .with_vertex(3, "vserver")
            .with_vertex(4, "volume")
            .with_vertex(5, "pserver")
            .with_vertex(6, "complex")
            .with_vertex(7, "vserver")
            .with_edge(1, 2, "has", true, false)
            .with_edge(2, 3, "owns", true, true)
            .with_edge(2, 7, "owns", true, true)
            .with_edge(3, 4, "uses", false, true)
            .with_edge(3, 5, "runsOn", false, false)
            .with_edge(3, 5, "runsOn", false, false)
            .with_edge(6, 5, "locatedIn", true, false)
    }

    fn ids(raw: &[u64]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId).collect()
    }

    #[test]
    fn test_find_parents() {
        let graph = inventory();
        let parents = TraversalEngine::find_parents(&graph, VertexId(3), SeedEmission::Include).unwrap();
        assert_eq!(parents, ids(&[3, 2, 1]));

        let parents = TraversalEngine::find_parents(&graph, VertexId(3), SeedEmission::Exclude).unwrap();
        assert_eq!(parents, ids(&[2, 1]));
    }

    #[test]
    fn test_find_children() {
        let graph = inventory();
        let children = TraversalEngine::find_children(&graph, VertexId(1), SeedEmission::Include).unwrap();
        assert_eq!(children, ids(&[1, 2, 3, 7]));

        // runsOn carries no flags, so pserver is not a child of vserver
        let children = TraversalEngine::find_children(&graph, VertexId(3), SeedEmission::Exclude).unwrap();
        assert!(children.is_empty());
    }

    #[test]
    fn test_find_deletable() {
        let graph = inventory();
        let deletable = TraversalEngine::find_deletable(&graph, VertexId(2), SeedEmission::Include).unwrap();
        assert_eq!(deletable, ids(&[2, 3, 7, 4]));
    }

    #[test]
    fn test_deletable_superset_of_children() {
        let graph = inventory();
        for id in 1..=7 {
            for seed in [SeedEmission::Include, SeedEmission::Exclude] {
                let children: HashSet<VertexId> =
                    TraversalEngine::find_children(&graph, VertexId(id), seed)
                        .unwrap()
                        .into_iter()
                        .collect();
                let deletable: HashSet<VertexId> =
                    TraversalEngine::find_deletable(&graph, VertexId(id), seed)
                        .unwrap()
                        .into_iter()
                        .collect();
                assert!(children.is_subset(&deletable), "vertex {id}");
            }
        }
    }

    #[test]
    fn test_closure_terminates_on_cycle() {
        let graph = TestGraph::default()
            .with_vertex(1, "a")
            .with_vertex(2, "b")
            .with_vertex(3, "c")
            .with_edge(1, 2, "x", true, false)
            .with_edge(2, 3, "x", true, false)
            .with_edge(3, 1, "x", true, false);

        let children = TraversalEngine::find_children(&graph, VertexId(1), SeedEmission::Include).unwrap();
        assert_eq!(children, ids(&[1, 2, 3]));

        let parents = TraversalEngine::find_parents(&graph, VertexId(1), SeedEmission::Exclude).unwrap();
        assert_eq!(parents, ids(&[3, 2]));
    }

    #[test]
    fn test_missing_start() {
        let graph = inventory();
        let parents = TraversalEngine::find_parents(&graph, VertexId(99), SeedEmission::Include).unwrap();
        assert!(parents.is_empty());
    }

    #[test]
    fn test_find_related_vertices_dedups() {
        let graph = inventory();
        let related =
            TraversalEngine::find_related_vertices(&graph, VertexId(3), Direction::Out, "runsOn", "pserver")
                .unwrap();
        assert_eq!(related, ids(&[5]));
    }

    #[test]
    fn test_find_related_vertices_filters() {
        let graph = inventory();

        let wrong_type =
            TraversalEngine::find_related_vertices(&graph, VertexId(3), Direction::Out, "runsOn", "complex")
                .unwrap();
        assert!(wrong_type.is_empty());

        let wrong_direction =
            TraversalEngine::find_related_vertices(&graph, VertexId(3), Direction::In, "runsOn", "pserver")
                .unwrap();
        assert!(wrong_direction.is_empty());

        let both = TraversalEngine::find_related_vertices(
            &graph,
            VertexId(5),
            Direction::Both,
            "locatedIn",
            "complex",
        )
        .unwrap();
        assert_eq!(both, ids(&[6]));
    }

    #[test]
    fn test_execute_query_global() {
        let graph = inventory();
        let query = TraversalQuery::global()
            .node_type("tenant")
            .mark_parent()
            .out("owns")
            .node_type("vserver");

        let result = TraversalEngine::execute_query(&graph, &query).unwrap();
        assert_eq!(result, ids(&[3, 7]));

        let parent = TraversalEngine::execute_parent_query(&graph, &query).unwrap();
        assert_eq!(parent, ids(&[2]));
    }

    #[test]
    fn test_execute_query_anchored_keeps_duplicates() {
        let graph = inventory();
        let query = TraversalQuery::from_vertex(VertexId(3)).out("runsOn");
        let result = TraversalEngine::execute_query(&graph, &query).unwrap();
        assert_eq!(result, ids(&[5, 5]));
    }

    #[test]
    fn test_store_errors_propagate() {
        let err = TraversalEngine::find_children(&UnreachableStore, VertexId(1), SeedEmission::Include)
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.to_string(), "store unreachable");

        let err = TraversalEngine::execute_query(&UnreachableStore, &TraversalQuery::global())
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}

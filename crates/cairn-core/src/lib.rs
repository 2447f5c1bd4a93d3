//! Cairn Core - Relationship resolution and graph traversal
//!
//! This crate provides the edge rule registry, the relationship resolver
//! that turns assertions into canonical resource paths, and the traversal
//! engine that walks an external graph store along declared edges.

pub mod edge_rule;
pub mod error;
pub mod graph;
pub mod query;
pub mod relationship;
pub mod resolver;
pub mod schema;
pub mod traversal;

pub use edge_rule::{EdgeRule, EdgeRuleFile, EdgeRuleRegistry};
pub use error::{Error, Result, StoreError};
pub use graph::{Direction, Edge, EdgeFlags, GraphStore, StoreResult, Vertex, VertexId};
pub use query::{Step, TraversalQuery};
pub use relationship::RelationshipAssertion;
pub use resolver::{PathSegment, PathSource, RelationshipResolver, Resolution, ResolvedPath};
pub use schema::{EntityDef, EntityType, Schema, SchemaFile};
pub use traversal::{SeedEmission, TraversalEngine};

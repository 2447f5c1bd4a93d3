//! Traversal expressions handed to the graph store

use crate::graph::{Direction, GraphStore, StoreResult, VertexId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One step of a traversal expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum Step {
    /// Move across edges in a direction, optionally restricted to a label
    Walk {
        direction: Direction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Keep vertices whose node-type matches
    NodeType { node_type: String },
    /// Keep vertices whose property renders as the given value
    Has { property: String, value: String },
}

impl FromStr for Step {
    type Err = String;

    /// Parse `out[:label]`, `in[:label]`, `both[:label]`, `type:<node-type>`
    /// or `has:<property>=<value>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, rest) = match s.split_once(':') {
            Some((head, rest)) => (head, Some(rest)),
            None => (s, None),
        };

        match (head, rest) {
            ("type", Some(node_type)) if !node_type.is_empty() => Ok(Self::NodeType {
                node_type: node_type.to_string(),
            }),
            ("has", Some(pair)) => match pair.split_once('=') {
                Some((property, value)) if !property.is_empty() => Ok(Self::Has {
                    property: property.to_string(),
                    value: value.to_string(),
                }),
                _ => Err(format!("invalid has step: {s} (expected has:<property>=<value>)")),
            },
            (dir, label) => {
                let direction = dir.parse::<Direction>()?;
                Ok(Self::Walk {
                    direction,
                    label: label.filter(|l| !l.is_empty()).map(str::to_string),
                })
            }
        }
    }
}

/// Traversal expression builder
///
/// A query optionally carries a start vertex and an ordered list of steps.
/// [`TraversalQuery::mark_parent`] records where the steps describing the
/// parent object end, so the same builder yields both the object query and
/// its parent query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalQuery {
    /// Anchor vertex; `None` runs against every vertex in the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<VertexId>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Number of leading steps that make up the parent query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_len: Option<usize>,
}

impl TraversalQuery {
    /// Query anchored at a start vertex
    pub fn from_vertex(start: VertexId) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    /// Query across all vertices
    pub fn global() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn out(self, label: impl Into<String>) -> Self {
        self.step(Step::Walk {
            direction: Direction::Out,
            label: Some(label.into()),
        })
    }

    pub fn in_(self, label: impl Into<String>) -> Self {
        self.step(Step::Walk {
            direction: Direction::In,
            label: Some(label.into()),
        })
    }

    pub fn both(self, label: impl Into<String>) -> Self {
        self.step(Step::Walk {
            direction: Direction::Both,
            label: Some(label.into()),
        })
    }

    pub fn node_type(self, node_type: impl Into<String>) -> Self {
        self.step(Step::NodeType {
            node_type: node_type.into(),
        })
    }

    pub fn has(self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.step(Step::Has {
            property: property.into(),
            value: value.into(),
        })
    }

    /// Everything added so far describes the parent object
    pub fn mark_parent(mut self) -> Self {
        self.parent_len = Some(self.steps.len());
        self
    }

    /// Steps of the parent query; the full query when no marker was set
    pub fn parent_steps(&self) -> &[Step] {
        match self.parent_len {
            Some(len) => &self.steps[..len.min(self.steps.len())],
            None => &self.steps,
        }
    }
}

/// Walk `steps` over `store` using only its edge and vertex primitives.
///
/// Results keep traversal multiplicity: a vertex reached along two paths
/// appears twice.
pub fn evaluate<S>(store: &S, start: Option<VertexId>, steps: &[Step]) -> StoreResult<Vec<VertexId>>
where
    S: GraphStore + ?Sized,
{
    let mut current = match start {
        Some(id) => match store.vertex(id)? {
            Some(_) => vec![id],
            None => Vec::new(),
        },
        None => store.vertex_ids()?,
    };

    for step in steps {
        let mut next = Vec::new();
        match step {
            Step::Walk { direction, label } => {
                for id in &current {
                    for edge in store.edges(*id, *direction, label.as_deref())? {
                        next.push(edge.other(*id));
                    }
                }
            }
            Step::NodeType { node_type } => {
                for id in &current {
                    if let Some(v) = store.vertex(*id)? {
                        if &v.node_type == node_type {
                            next.push(*id);
                        }
                    }
                }
            }
            Step::Has { property, value } => {
                for id in &current {
                    if let Some(v) = store.vertex(*id)? {
                        if v.property_matches(property, value) {
                            next.push(*id);
                        }
                    }
                }
            }
        }
        tracing::trace!("Step {:?} kept {} of {} vertices", step, next.len(), current.len());
        current = next;
    }

    Ok(current)
}

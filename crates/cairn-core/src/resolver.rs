//! Relationship resolution: from an unordered bag of assertions to one
//! canonical resource path.
//!
//! The resolver groups assertions into one related entity per type, orders
//! those types into a containment chain ending at the start type, and joins
//! the per-type URI fragments. Ordering is a backtracking search: working
//! from the tail of the chain toward its head, each position takes the first
//! type (scanning from the highest index down) that has an outbound, labeled
//! edge rule to the type after it.

use crate::edge_rule::EdgeRuleRegistry;
use crate::error::{Error, Result};
use crate::graph::Direction;
use crate::relationship::RelationshipAssertion;
use crate::schema::{EntityType, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// One entity in a resolved path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub entity_type: EntityType,

    /// Key property values of this entity
    pub keys: BTreeMap<String, String>,
}

/// Where a resolved path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathSource {
    DirectLink,
    Assertions,
}

/// A canonical resource path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPath {
    /// Slash-delimited canonical path
    pub path: String,

    /// Ordered segments, outermost ancestor first; empty for direct links
    pub segments: Vec<PathSegment>,

    pub source: PathSource,
}

impl std::fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Outcome of a resolution call
#[derive(Debug)]
pub struct Resolution {
    pub resolved: ResolvedPath,

    /// Set when a direct link was supplied but could not be used
    pub link_error: Option<Error>,
}

/// Related entity materialized from its assertions
#[derive(Debug, Clone)]
struct RelatedEntity {
    entity_type: EntityType,
    properties: BTreeMap<String, String>,
}

/// Resolves relationship assertions into canonical paths
#[derive(Debug, Clone, Copy)]
pub struct RelationshipResolver<'a> {
    schema: &'a Schema,
    rules: &'a EdgeRuleRegistry,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(schema: &'a Schema, rules: &'a EdgeRuleRegistry) -> Self {
        Self { schema, rules }
    }

    /// Resolve raw `{type}.{property}` keyed assertions.
    ///
    /// A usable `direct_link` short-circuits everything else. Otherwise every
    /// key is checked for shape before any other validation runs.
    pub fn resolve<K, V>(
        &self,
        start_type: &EntityType,
        assertions: &[(K, V)],
        direct_link: Option<&str>,
    ) -> Result<Resolution>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let link_error = match Self::follow_link(direct_link) {
            Ok(resolved) => {
                return Ok(Resolution {
                    resolved,
                    link_error: None,
                })
            }
            Err(e) => e,
        };

        let parsed = assertions
            .iter()
            .map(|(k, v)| RelationshipAssertion::parse(k.as_ref(), v.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let resolved = self.resolve_parsed(start_type, &parsed)?;
        Ok(Resolution {
            resolved,
            link_error,
        })
    }

    /// Resolve already parsed assertions, falling back from a bad direct link
    pub fn resolve_assertions(
        &self,
        start_type: &EntityType,
        assertions: &[RelationshipAssertion],
        direct_link: Option<&str>,
    ) -> Result<Resolution> {
        let link_error = match Self::follow_link(direct_link) {
            Ok(resolved) => {
                return Ok(Resolution {
                    resolved,
                    link_error: None,
                })
            }
            Err(e) => e,
        };

        let resolved = self.resolve_parsed(start_type, assertions)?;
        Ok(Resolution {
            resolved,
            link_error,
        })
    }

    /// The direct link's path, or why it could not be used
    fn follow_link(direct_link: Option<&str>) -> std::result::Result<ResolvedPath, Option<Error>> {
        let Some(link) = direct_link else {
            return Err(None);
        };
        match Url::parse(link) {
            Ok(url) => {
                tracing::debug!("Using direct link path {}", url.path());
                Ok(ResolvedPath {
                    path: url.path().to_string(),
                    segments: Vec::new(),
                    source: PathSource::DirectLink,
                })
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed direct link {:?}: {}", link, e);
                Err(Some(Error::MalformedDirectLink {
                    link: link.to_string(),
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn resolve_parsed(
        &self,
        start_type: &EntityType,
        assertions: &[RelationshipAssertion],
    ) -> Result<ResolvedPath> {
        let entities = self.materialize(assertions)?;

        let mut types: Vec<EntityType> = entities.iter().map(|e| e.entity_type.clone()).collect();
        let anchored = match types.iter().position(|t| t == start_type) {
            Some(idx) => {
                let start = types.remove(idx);
                types.push(start);
                true
            }
            None => false,
        };

        tracing::debug!(
            "Ordering {} related types toward {} (anchored: {})",
            types.len(),
            start_type,
            anchored
        );

        let unresolved = if anchored { types.len() - 1 } else { types.len() };
        let order = self
            .place(types.clone(), unresolved, start_type)
            .ok_or_else(|| Error::NoValidOrdering {
                types: types.iter().map(|t| t.0.clone()).collect(),
            })?;

        let mut path = String::new();
        let mut segments = Vec::with_capacity(order.len());
        for entity_type in &order {
            let Some(entity) = entities.iter().find(|e| &e.entity_type == entity_type) else {
                return Err(Error::Internal(format!("{entity_type} lost during ordering")));
            };
            let segment = self.segment(entity)?;
            let values: Vec<&str> = self.key_values(entity)?;
            path.push_str(&self.schema.build_fragment(entity_type.as_str(), &values)?);
            segments.push(segment);
        }

        tracing::debug!("Resolved path {}", path);
        Ok(ResolvedPath {
            path,
            segments,
            source: PathSource::Assertions,
        })
    }

    /// One entity per distinct target type, in first-seen order
    fn materialize(&self, assertions: &[RelationshipAssertion]) -> Result<Vec<RelatedEntity>> {
        let mut entities: Vec<RelatedEntity> = Vec::new();

        for assertion in assertions {
            let def = self
                .schema
                .entity(assertion.target_type.as_str())
                .ok_or_else(|| Error::UnknownEntityType(assertion.target_type.0.clone()))?;

            if !def.declares(&assertion.property_name) {
                return Err(Error::UnknownProperty {
                    entity_type: assertion.target_type.0.clone(),
                    property: assertion.property_name.clone(),
                });
            }

            let idx = match entities
                .iter()
                .position(|e| e.entity_type == assertion.target_type)
            {
                Some(idx) => idx,
                None => {
                    entities.push(RelatedEntity {
                        entity_type: assertion.target_type.clone(),
                        properties: BTreeMap::new(),
                    });
                    entities.len() - 1
                }
            };

            entities[idx].properties.insert(
                assertion.property_name.clone(),
                assertion.property_value.clone(),
            );
        }

        Ok(entities)
    }

    /// Fill positions `0..unresolved` from the back, each with a type that
    /// points OUT to the type after it. Every frame owns its ordering, so a
    /// failed branch leaves nothing to undo.
    fn place(
        &self,
        order: Vec<EntityType>,
        unresolved: usize,
        pivot: &EntityType,
    ) -> Option<Vec<EntityType>> {
        if unresolved == 0 {
            return Some(order);
        }
        let pos = unresolved - 1;

        for idx in (0..=pos).rev() {
            if !self.leads_to(&order[idx], pivot) {
                continue;
            }

            let mut attempt = order.clone();
            attempt.swap(idx, pos);
            let next_pivot = attempt[pos].clone();
            tracing::trace!("Trying {} before {} at position {}", next_pivot, pivot, pos);

            if let Some(done) = self.place(attempt, pos, &next_pivot) {
                return Some(done);
            }
            tracing::trace!("Backtracking from {} at position {}", next_pivot, pos);
        }

        None
    }

    fn leads_to(&self, candidate: &EntityType, pivot: &EntityType) -> bool {
        matches!(
            self.rules.lookup(candidate.as_str(), pivot.as_str()),
            Some(rule) if rule.direction == Direction::Out && !rule.label.is_empty()
        )
    }

    fn key_values<'e>(&self, entity: &'e RelatedEntity) -> Result<Vec<&'e str>> {
        let def = self
            .schema
            .entity(entity.entity_type.as_str())
            .ok_or_else(|| Error::UnknownEntityType(entity.entity_type.0.clone()))?;

        def.keys
            .iter()
            .map(|key| {
                entity
                    .properties
                    .get(key)
                    .map(String::as_str)
                    .ok_or_else(|| Error::MissingKeyProperty {
                        entity_type: entity.entity_type.0.clone(),
                        property: key.clone(),
                    })
            })
            .collect()
    }

    fn segment(&self, entity: &RelatedEntity) -> Result<PathSegment> {
        let def = self
            .schema
            .entity(entity.entity_type.as_str())
            .ok_or_else(|| Error::UnknownEntityType(entity.entity_type.0.clone()))?;

        let keys = entity
            .properties
            .iter()
            .filter(|(k, _)| def.keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(PathSegment {
            entity_type: entity.entity_type.clone(),
            keys,
        })
    }
}

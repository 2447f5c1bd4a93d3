//! Edge rules: which entity types connect, how, and with what semantics

use crate::error::{Error, Result};
use crate::graph::{Direction, EdgeFlags};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Declared relationship between two entity types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EdgeRule {
    /// Source entity type
    pub from: String,

    /// Target entity type
    pub to: String,

    /// Edge label written to the store
    pub label: String,

    /// Direction of the edge relative to `from`
    pub direction: Direction,

    /// Parent/child ownership edge
    #[serde(default, rename = "containment")]
    pub is_containment: bool,

    /// Deleting the source cascades to the target
    #[serde(default, rename = "cascade-delete")]
    pub cascades_on_delete: bool,
}

impl EdgeRule {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            direction,
            is_containment: false,
            cascades_on_delete: false,
        }
    }

    pub fn containment(mut self) -> Self {
        self.is_containment = true;
        self
    }

    pub fn cascading(mut self) -> Self {
        self.cascades_on_delete = true;
        self
    }

    /// The same rule seen from the target type
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            label: self.label.clone(),
            direction: self.direction.reverse(),
            is_containment: self.is_containment,
            cascades_on_delete: self.cascades_on_delete,
        }
    }
}

impl From<&EdgeRule> for EdgeFlags {
    fn from(rule: &EdgeRule) -> Self {
        Self {
            containment: rule.is_containment,
            cascade_delete: rule.cascades_on_delete,
        }
    }
}

/// On-disk shape of an edge rule file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeRuleFile {
    #[serde(default)]
    pub rules: Vec<EdgeRule>,
}

/// Immutable lookup table of edge rules keyed by ordered type pair
#[derive(Debug, Clone, Default)]
pub struct EdgeRuleRegistry {
    rules: HashMap<(String, String), EdgeRule>,
    declared: Vec<EdgeRule>,
}

impl EdgeRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, failing on the first duplicate pair
    pub fn from_rules(rules: impl IntoIterator<Item = EdgeRule>) -> Result<Self> {
        let mut registry = Self::new();
        for rule in rules {
            registry.insert(rule)?;
        }
        tracing::debug!("Loaded {} edge rules", registry.declared.len());
        Ok(registry)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: EdgeRuleFile = serde_json::from_str(s)?;
        Self::from_rules(file.rules)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: EdgeRuleFile =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid edge rules: {e}")))?;
        Self::from_rules(file.rules)
    }

    /// Load a rule file, choosing TOML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Register a rule and its implied reverse
    pub fn insert(&mut self, rule: EdgeRule) -> Result<()> {
        let forward = (rule.from.clone(), rule.to.clone());
        let backward = (rule.to.clone(), rule.from.clone());

        if self.rules.contains_key(&forward) || self.rules.contains_key(&backward) {
            return Err(Error::DuplicateEdgeRule {
                from: rule.from,
                to: rule.to,
            });
        }

        if forward != backward {
            self.rules.insert(backward, rule.reversed());
        }
        self.rules.insert(forward, rule.clone());
        self.declared.push(rule);
        Ok(())
    }

    /// Rule for the ordered pair, with direction relative to `source`
    pub fn lookup(&self, source: &str, target: &str) -> Option<&EdgeRule> {
        self.rules.get(&(source.to_string(), target.to_string()))
    }

    /// Every rule whose source is `entity_type`, sorted by target
    pub fn rules_for(&self, entity_type: &str) -> Vec<&EdgeRule> {
        let mut rules: Vec<&EdgeRule> = self
            .rules
            .values()
            .filter(|r| r.from == entity_type)
            .collect();
        rules.sort_by(|a, b| a.to.cmp(&b.to));
        rules
    }

    /// Rules in declaration order
    pub fn declared(&self) -> &[EdgeRule] {
        &self.declared
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}

//! Entity type definitions and URI fragment templates

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes escaped inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Entity type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(pub String);

impl EntityType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Definition of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,

    /// Identifying properties, in fragment order
    pub keys: Vec<String>,

    /// Other declared properties
    #[serde(default)]
    pub properties: Vec<String>,

    /// Fragment template such as `/pservers/pserver/{hostname}`.
    /// Defaults to `/<name>/{key}...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            properties: Vec::new(),
            template: None,
        }
    }

    pub fn with_properties(mut self, properties: &[&str]) -> Self {
        self.properties = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Whether `property` is a key or a declared property
    pub fn declares(&self, property: &str) -> bool {
        self.keys.iter().any(|k| k == property) || self.properties.iter().any(|p| p == property)
    }

    /// Check that every `{key}` placeholder in the template is a key
    pub fn validate(&self) -> Result<()> {
        for part in self.fragment_template().split('/') {
            if let Some(key) = placeholder(part) {
                if !self.keys.iter().any(|k| k == key) {
                    return Err(Error::Config(format!(
                        "template for {} names unknown key {}",
                        self.name, key
                    )));
                }
            }
        }
        Ok(())
    }

    /// The effective fragment template
    pub fn fragment_template(&self) -> String {
        match &self.template {
            Some(t) => t.clone(),
            None => {
                let mut t = format!("/{}", self.name);
                for key in &self.keys {
                    t.push_str("/{");
                    t.push_str(key);
                    t.push('}');
                }
                t
            }
        }
    }
}

/// On-disk shape of a schema file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub types: Vec<EntityDef>,
}

/// Known entity types
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: HashMap<String, EntityDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: impl IntoIterator<Item = EntityDef>) -> Result<Self> {
        let mut types = HashMap::new();
        for def in defs {
            def.validate()?;
            types.insert(def.name.clone(), def);
        }
        tracing::debug!("Loaded schema with {} entity types", types.len());
        Ok(Self { types })
    }

    pub fn with_entity(mut self, def: EntityDef) -> Self {
        self.types.insert(def.name.clone(), def);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(s)?;
        Self::from_defs(file.types)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: SchemaFile =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid schema: {e}")))?;
        Self::from_defs(file.types)
    }

    /// Load a schema file, choosing TOML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build the URI fragment for `entity_type` from its key values.
    ///
    /// `key_values` must follow the order of the type's keys. Each `{key}`
    /// segment of the template is replaced by the matching value,
    /// percent-encoded as a single path segment. Dot-only values have their
    /// dots escaped so they never read as relative segments.
    pub fn build_fragment(&self, entity_type: &str, key_values: &[&str]) -> Result<String> {
        let def = self
            .entity(entity_type)
            .ok_or_else(|| Error::UnknownEntityType(entity_type.to_string()))?;

        if key_values.len() != def.keys.len() {
            return Err(Error::Internal(format!(
                "{} expects {} key values, got {}",
                entity_type,
                def.keys.len(),
                key_values.len()
            )));
        }

        let mut fragment = String::new();
        for part in def.fragment_template().split('/').filter(|p| !p.is_empty()) {
            fragment.push('/');
            let Some(key) = placeholder(part) else {
                fragment.push_str(part);
                continue;
            };
            let idx = def.keys.iter().position(|k| k == key).ok_or_else(|| {
                Error::Config(format!("template for {entity_type} names unknown key {key}"))
            })?;
            let value = key_values[idx];
            if value.is_empty() {
                return Err(Error::MissingKeyProperty {
                    entity_type: entity_type.to_string(),
                    property: key.to_string(),
                });
            }
            if value.bytes().all(|b| b == b'.') {
                fragment.push_str(&"%2E".repeat(value.len()));
            } else {
                fragment.extend(utf8_percent_encode(value, SEGMENT));
            }
        }
        Ok(fragment)
    }
}

/// The key named by a `{key}` template segment
fn placeholder(part: &str) -> Option<&str> {
    part.strip_prefix('{').and_then(|p| p.strip_suffix('}'))
}

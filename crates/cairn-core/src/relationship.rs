//! Relationship assertions: `"{type}.{property}" = value` pairs

use crate::error::{Error, Result};
use crate::schema::EntityType;
use serde::{Deserialize, Serialize};

/// One asserted property value on a related entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipAssertion {
    pub target_type: EntityType,
    pub property_name: String,
    pub property_value: String,
}

impl RelationshipAssertion {
    pub fn new(
        target_type: impl Into<EntityType>,
        property_name: impl Into<String>,
        property_value: impl Into<String>,
    ) -> Self {
        Self {
            target_type: target_type.into(),
            property_name: property_name.into(),
            property_value: property_value.into(),
        }
    }

    /// Parse a serialized key of the exact form `{type}.{property}`
    pub fn parse(key: &str, value: impl Into<String>) -> Result<Self> {
        let malformed = || Error::MalformedRelationshipKey {
            key: key.to_string(),
        };

        let (target_type, property) = key.split_once('.').ok_or_else(malformed)?;
        if target_type.is_empty() || property.is_empty() || property.contains('.') {
            return Err(malformed());
        }

        Ok(Self::new(target_type, property, value))
    }

    /// The serialized `{type}.{property}` key
    pub fn key(&self) -> String {
        format!("{}.{}", self.target_type, self.property_name)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        let a = RelationshipAssertion::parse("pserver.hostname", "h1").unwrap();
        assert_eq!(a.target_type.as_str(), "pserver");
        assert_eq!(a.property_name, "hostname");
        assert_eq!(a.property_value, "h1");
        assert_eq!(a.key(), "pserver.hostname");
    }

    #[test]
    fn test_malformed_keys() {
        for key in ["pserver", ".hostname", "pserver.", "a.b.c", ""] {
            let err = RelationshipAssertion::parse(key, "v").unwrap_err();
            assert!(
                matches!(err, Error::MalformedRelationshipKey { key: ref k } if k == key),
                "key {key:?} should be malformed"
            );
        }
    }
}

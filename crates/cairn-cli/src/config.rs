//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file location
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cairn")
        .join("config.toml")
}

fn default_true() -> bool {
    true
}

/// Configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Entity type definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,

    /// Edge rule table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_rules_path: Option<PathBuf>,

    /// Graph snapshot used by traverse and query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_path: Option<PathBuf>,

    /// Whether closures list their starting vertex
    #[serde(default = "default_true")]
    pub include_seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: None,
            edge_rules_path: None,
            graph_path: None,
            include_seed: default_true(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["schema_path", "edge_rules_path", "graph_path", "include_seed"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let display = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        match key {
            "schema_path" => display(&self.schema_path),
            "edge_rules_path" => display(&self.edge_rules_path),
            "graph_path" => display(&self.graph_path),
            "include_seed" => Some(self.include_seed.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "schema_path" => self.schema_path = Some(PathBuf::from(value)),
            "edge_rules_path" => self.edge_rules_path = Some(PathBuf::from(value)),
            "graph_path" => self.graph_path = Some(PathBuf::from(value)),
            "include_seed" => {
                self.include_seed = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("include_seed must be true or false"))?
            }
            _ => anyhow::bail!(
                "Unknown config key: {} (available: {})",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("schema_path", "/etc/cairn/schema.toml").unwrap();
        config.set("include_seed", "false").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.get("schema_path").as_deref(),
            Some("/etc/cairn/schema.toml")
        );
        assert!(!loaded.include_seed);
        assert!(loaded.graph_path.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/cairn.toml")).unwrap();
        assert!(config.include_seed);
        assert!(config.get("graph_path").is_none());
    }

    #[test]
    fn test_unknown_key() {
        let mut config = Config::default();
        assert!(config.set("color", "blue").is_err());
        assert!(config.set("include_seed", "maybe").is_err());
        assert!(config.get("color").is_none());
    }
}

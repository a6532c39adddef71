//! Mapper configuration
//!
//! Options are loaded from, in order of precedence:
//! - Environment variables (`GRAPHMAP_*`)
//! - A configuration file (YAML or JSON, chosen by extension)
//! - Default values

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behavior switches consulted during a mapping call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Return lazy proxies for targets that support deferred materialization
    pub lazy_loading: bool,

    /// Read existing target values and populate them in place
    pub target_value_reading: bool,

    /// Coerce scalars into lone-scalar properties without dispatch
    pub scalar_short_circuit: bool,

    /// Collect a trace of every mapping step
    pub trace: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            lazy_loading: true,
            target_value_reading: true,
            scalar_short_circuit: true,
            trace: false,
        }
    }
}

impl MapperOptions {
    pub fn lazy_loading(mut self, enabled: bool) -> Self {
        self.lazy_loading = enabled;
        self
    }

    pub fn target_value_reading(mut self, enabled: bool) -> Self {
        self.target_value_reading = enabled;
        self
    }

    pub fn scalar_short_circuit(mut self, enabled: bool) -> Self {
        self.scalar_short_circuit = enabled;
        self
    }

    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }
}

/// A class pair whose metadata is computed when the mapper is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmUpPair {
    pub source: String,
    pub target: String,
}

/// File-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub options: MapperOptions,

    /// Metadata to precompute
    pub warm_up: Vec<WarmUpPair>,
}

impl MapperConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load a file and overlay the environment
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `GRAPHMAP_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Overlay variables obtained from `lookup`
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let options = &mut self.options;
        let switches: [(&str, &mut bool); 4] = [
            ("GRAPHMAP_LAZY_LOADING", &mut options.lazy_loading),
            ("GRAPHMAP_TARGET_VALUE_READING", &mut options.target_value_reading),
            ("GRAPHMAP_SCALAR_SHORT_CIRCUIT", &mut options.scalar_short_circuit),
            ("GRAPHMAP_TRACE", &mut options.trace),
        ];

        for (name, slot) in switches {
            if let Some(raw) = lookup(name) {
                *slot = parse_bool(name, &raw)?;
            }
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::configuration(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = MapperOptions::default();
        assert!(options.lazy_loading);
        assert!(options.target_value_reading);
        assert!(options.scalar_short_circuit);
        assert!(!options.trace);
    }

    #[test]
    fn test_load_yaml_with_partial_options() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graphmap.yaml");
        std::fs::write(
            &path,
            "options:\n  lazy_loading: false\nwarm_up:\n  - source: Book\n    target: BookDto\n",
        )
        .unwrap();

        let config = MapperConfig::from_file(&path).unwrap();
        assert!(!config.options.lazy_loading);
        assert!(config.options.target_value_reading);
        assert_eq!(config.warm_up.len(), 1);
        assert_eq!(config.warm_up[0].target, "BookDto");
    }

    #[test]
    fn test_save_and_reload_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("graphmap.json");
        let config = MapperConfig {
            options: MapperOptions::default().trace(true),
            warm_up: Vec::new(),
        };
        config.save(&path).unwrap();

        assert_eq!(MapperConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("GRAPHMAP_LAZY_LOADING", "off"),
            ("GRAPHMAP_TRACE", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = MapperConfig::default();
        config
            .apply_env_from(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.options.lazy_loading);
        assert!(config.options.trace);
        assert!(config.options.scalar_short_circuit);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = MapperConfig::default();
        let result = config.apply_env_from(|name| {
            (name == "GRAPHMAP_TRACE").then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(MapperConfig::from_file(&path), Err(Error::Json { .. })));
    }
}

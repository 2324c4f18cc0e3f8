//! Engine-wide configuration.
//!
//! Three tunables: the exec timeout, the undefined-name buffer cap, and the
//! `[...]` instance-index ceiling. This module exposes them as a small
//! YAML-backed `EngineConfig`, loaded the way a layered config tree usually
//! is — env-var override first, falls back to a bundled default so the
//! common case needs no file on disk at all.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::value::{MAX_INSTANCE_INDEX, MAX_TAG_VALUE, MAX_UNDEFINED_NAME};

/// Engine-wide tunables. Defaults match the engine's compiled-in limit
/// constants, so a deployment only needs a config file to override one of
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_exec_timeout_ms")]
    pub exec_timeout_ms: u64,

    #[serde(default = "default_undefined_name_cap")]
    pub undefined_name_cap: usize,

    #[serde(default = "default_max_instance_index")]
    pub max_instance_index: u32,

    #[serde(default = "default_max_tag_value")]
    pub max_tag_value: u8,
}

fn default_exec_timeout_ms() -> u64 {
    10_000
}

fn default_undefined_name_cap() -> usize {
    MAX_UNDEFINED_NAME
}

fn default_max_instance_index() -> u32 {
    MAX_INSTANCE_INDEX
}

fn default_max_tag_value() -> u8 {
    MAX_TAG_VALUE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exec_timeout_ms: default_exec_timeout_ms(),
            undefined_name_cap: default_undefined_name_cap(),
            max_instance_index: default_max_instance_index(),
            max_tag_value: default_max_tag_value(),
        }
    }
}

/// Loads an [`EngineConfig`] from the environment or a YAML file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `TMPL_ENGINE_CONFIG` pointing at a YAML file takes precedence; absent
    /// that, the compiled-in defaults apply.
    pub fn from_env() -> Result<EngineConfig> {
        match std::env::var("TMPL_ENGINE_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(EngineConfig::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<EngineConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing engine config from {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_in_limits() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.undefined_name_cap, MAX_UNDEFINED_NAME);
        assert_eq!(cfg.max_instance_index, MAX_INSTANCE_INDEX);
        assert_eq!(cfg.max_tag_value, MAX_TAG_VALUE);
    }

    #[test]
    fn from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "exec_timeout_ms: 5000\n").unwrap();
        let cfg = ConfigLoader::from_file(&path).unwrap();
        assert_eq!(cfg.exec_timeout_ms, 5000);
        // Unset fields still take their defaults.
        assert_eq!(cfg.undefined_name_cap, MAX_UNDEFINED_NAME);
    }

    #[test]
    fn from_env_without_var_falls_back_to_defaults() {
        std::env::remove_var("TMPL_ENGINE_CONFIG");
        let cfg = ConfigLoader::from_env().unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }
}

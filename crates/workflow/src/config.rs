//! Workflow configuration.
//!
//! Loaded from TOML. Every section is optional.
//!
//! # Example
//!
//! ```toml
//! [audit]
//! delta_engine = "structural"
//!
//! [navigation]
//! action = "agreement.action_agreement"
//! ```

use std::path::{Path, PathBuf};

use renewal_core::{diff, Delta, Document};
use serde::{Deserialize, Serialize};

/// Name of the built-in structural delta engine.
pub const STRUCTURAL_ENGINE: &str = "structural";

/// Default action opened after a renewal is confirmed.
pub const DEFAULT_AGREEMENT_ACTION: &str = "agreement.action_agreement";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured delta engine is not available.
    #[error("delta engine '{0}' is not available")]
    MissingDependency(String),
}

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level workflow configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalConfig {
    pub audit: AuditConfig,
    pub navigation: NavigationConfig,
}

/// `[audit]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Engine used to compute the term delta of a renewal.
    pub delta_engine: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            delta_engine: STRUCTURAL_ENGINE.to_string(),
        }
    }
}

/// `[navigation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Name of the action the caller is sent to after confirming.
    pub action: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            action: DEFAULT_AGREEMENT_ACTION.to_string(),
        }
    }
}

/// The delta engines this build knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaEngine {
    /// Recursive mapping diff with whole-value replacement of lists and
    /// scalars.
    Structural,
}

impl DeltaEngine {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            STRUCTURAL_ENGINE => Ok(DeltaEngine::Structural),
            other => Err(ConfigError::MissingDependency(other.to_string())),
        }
    }

    pub fn diff(&self, before: &Document, after: &Document) -> Delta {
        match self {
            DeltaEngine::Structural => diff(before, after),
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl RenewalConfig {
    /// Parse and validate a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RenewalConfig = toml::from_str(content)?;
        config.delta_engine()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the configured delta engine.
    pub fn delta_engine(&self) -> Result<DeltaEngine, ConfigError> {
        DeltaEngine::from_name(&self.audit.delta_engine)
    }
}

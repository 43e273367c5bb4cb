//! Run configuration
//!
//! Paths and behavior switches for one reconciliation run. Loadable from a
//! TOML file; the `tei-sync` binary layers command-line flags on top.
//!
//! ```toml
//! source_path = "sanders_bibliography.json"
//! target_path = "sanders_bibliography.xml"
//! match_policy = "unique"
//! couple_note_to_imprint = false
//! dry_run = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reconcile::{MatchPolicy, ReconcileOptions};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// CSL-JSON bibliography export (read only)
    pub source_path: PathBuf,
    /// TEI document, read and rewritten in place
    pub target_path: PathBuf,
    pub match_policy: MatchPolicy,
    /// Legacy behavior: a missing `imprint` also skips the note patch
    pub couple_note_to_imprint: bool,
    /// Reconcile and report without writing
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("bibliography.json"),
            target_path: PathBuf::from("bibliography.xml"),
            match_policy: MatchPolicy::default(),
            couple_note_to_imprint: false,
            dry_run: false,
        }
    }
}

impl SyncConfig {
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("source_path"));
        }
        if self.target_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("target_path"));
        }
        if same_file(&self.source_path, &self.target_path) {
            return Err(ConfigError::Invalid(format!(
                "source_path and target_path are both '{}'",
                self.source_path.display()
            )));
        }
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            match_policy: self.match_policy,
            couple_note_to_imprint: self.couple_note_to_imprint,
        }
    }
}

/// Equal paths, or paths to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

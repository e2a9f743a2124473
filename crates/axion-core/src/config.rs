//! Project configuration and policy
//!
//! `config.yaml` carries two policy fields the engine consults on every
//! mutation and reveal: `protected_keys` (never shown in plaintext) and
//! `validation` (variable name → regex the value must match).
//! `cloud.json` records the cloud link for a project.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::{self, ProjectPaths};

/// Raw shape of `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfigFile {
    #[serde(default)]
    pub protected_keys: Vec<String>,
    #[serde(default)]
    pub validation: BTreeMap<String, String>,
}

/// Loaded policy with validation patterns compiled once.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    protected_keys: Vec<String>,
    validation: BTreeMap<String, (String, Regex)>,
}

impl ProjectConfig {
    /// Load policy for a project. A missing file yields the empty policy.
    pub fn load(paths: &ProjectPaths) -> Result<Self> {
        let path = paths.config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let file: ProjectConfigFile = serde_yaml_ng::from_str(&raw)?;
        Self::from_file(file)
    }

    /// Build policy from an already-parsed file.
    pub fn from_file(file: ProjectConfigFile) -> Result<Self> {
        let mut validation = BTreeMap::new();
        for (key, pattern) in file.validation {
            let compiled = Regex::new(&pattern).map_err(|e| Error::InvalidPattern {
                key: key.clone(),
                message: e.to_string(),
            })?;
            validation.insert(key, (pattern, compiled));
        }
        Ok(Self {
            protected_keys: file.protected_keys,
            validation,
        })
    }

    /// Whether a key's plaintext must never be revealed.
    pub fn is_protected(&self, key: &str) -> bool {
        self.protected_keys.iter().any(|k| k == key)
    }

    /// Check a value against the pattern bound to `key`, if any.
    pub fn validate(&self, key: &str, value: &str) -> Result<()> {
        if let Some((pattern, compiled)) = self.validation.get(key) {
            if !compiled.is_match(value) {
                return Err(Error::validation_failed(key, pattern.clone()));
            }
        }
        Ok(())
    }
}

/// Cloud link record (`cloud.json`). Present only for cloud-linked projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudLink {
    pub project_id: String,
    pub api_url: String,
    pub linked_at: String,
}

impl CloudLink {
    /// Read the link record, or `None` when the project is local-only.
    pub fn load(paths: &ProjectPaths) -> Result<Option<Self>> {
        let path = paths.cloud_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Persist the link record with owner-only permissions.
    pub fn save(&self, paths: &ProjectPaths) -> Result<()> {
        paths.ensure_dir()?;
        let contents = serde_json::to_vec_pretty(self)?;
        paths::write_atomic(&paths.cloud_path(), &contents, Some(0o600))?;
        Ok(())
    }
}

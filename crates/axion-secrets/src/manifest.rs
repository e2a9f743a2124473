//! Manifest data model
//!
//! A manifest is a tree keyed by service then variable, with a parallel
//! overlay tree keyed by scope → service → variable. The reserved service
//! `_global` holds variables shared across all services. BTreeMaps keep
//! the serialised form byte-stable.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use axion_core::config::ProjectConfig;
use axion_core::error::{Error, Result};

/// Reserved service bucket shared across all services.
pub const GLOBAL_SERVICE: &str = "_global";

/// Variables of one service.
pub type VariableMap = BTreeMap<String, String>;

/// Services of one tier (default or one scope).
pub type ServiceMap = BTreeMap<String, VariableMap>;

/// Deployment scope: an overlay tier over the default tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Development,
    Staging,
    Production,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Development => "development",
            Scope::Staging => "staging",
            Scope::Production => "production",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Scope::Development),
            "staging" => Ok(Scope::Staging),
            "production" => Ok(Scope::Production),
            other => Err(Error::InvalidScope {
                scope: other.to_string(),
            }),
        }
    }
}

fn variable_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

fn service_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z][A-Za-z0-9_-]*$").unwrap())
}

/// Validate a variable name.
pub fn validate_variable_name(name: &str) -> Result<()> {
    if variable_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_variable_name(name))
    }
}

/// Validate a service name (`_global` is always accepted).
pub fn validate_service_name(name: &str) -> Result<()> {
    if name == GLOBAL_SERVICE || service_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_service_name(name))
    }
}

/// The decrypted manifest.
///
/// `version` is a monotonic revision counter bumped on every save; the
/// sync arbiter compares it numerically. Legacy manifests stored it as a
/// numeric string ("2", "1.0") and are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(deserialize_with = "deserialize_revision")]
    pub version: u64,
    #[serde(default)]
    pub services: ServiceMap,
    #[serde(default)]
    pub scopes: BTreeMap<Scope, ServiceMap>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// An empty manifest at revision 1, with the `_global` bucket present.
    pub fn new() -> Self {
        let mut services = ServiceMap::new();
        services.insert(GLOBAL_SERVICE.to_string(), VariableMap::new());
        Self {
            version: 1,
            services,
            scopes: BTreeMap::new(),
        }
    }

    /// Serialize to JSON bytes (byte-stable across identical content).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Set a variable after name validation and the policy check.
    ///
    /// Without a scope the value lands in the default tree; with one it
    /// lands in the scope overlay.
    pub fn set_variable(
        &mut self,
        key: &str,
        value: &str,
        service: &str,
        scope: Option<Scope>,
        policy: &ProjectConfig,
    ) -> Result<()> {
        validate_variable_name(key)?;
        validate_service_name(service)?;
        policy.validate(key, value)?;

        let tier = match scope {
            None => &mut self.services,
            Some(scope) => self.scopes.entry(scope).or_default(),
        };
        tier.entry(service.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Remove a variable; returns whether anything changed. Emptied
    /// service buckets are pruned, except the default `_global` bucket.
    pub fn remove_variable(&mut self, key: &str, service: &str, scope: Option<Scope>) -> bool {
        let tier = match scope {
            None => &mut self.services,
            Some(scope) => match self.scopes.get_mut(&scope) {
                Some(tier) => tier,
                None => return false,
            },
        };

        let Some(bucket) = tier.get_mut(service) else {
            return false;
        };
        let removed = bucket.remove(key).is_some();

        if bucket.is_empty() && !(scope.is_none() && service == GLOBAL_SERVICE) {
            tier.remove(service);
        }
        if let Some(s) = scope {
            if self.scopes.get(&s).is_some_and(|t| t.is_empty()) {
                self.scopes.remove(&s);
            }
        }
        removed
    }

    /// Raw lookup without resolution (no overlay, no templates).
    pub fn raw_get(&self, key: &str, service: &str, scope: Option<Scope>) -> Option<&str> {
        let tier = match scope {
            None => &self.services,
            Some(scope) => self.scopes.get(&scope)?,
        };
        tier.get(service)?.get(key).map(String::as_str)
    }
}

fn deserialize_revision<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct RevisionVisitor;

    impl serde::de::Visitor<'_> for RevisionVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer revision or a legacy numeric string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom("negative revision"))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<u64, E> {
            // Legacy form: "2", or dotted "1.0" whose integer part is taken.
            let integer_part = v.split('.').next().unwrap_or(v);
            integer_part
                .parse::<u64>()
                .map_err(|_| E::custom(format!("invalid manifest revision: {v:?}")))
        }
    }

    deserializer.deserialize_any(RevisionVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ProjectConfig {
        ProjectConfig::default()
    }

    #[test]
    fn test_new_manifest_has_global_bucket() {
        let manifest = Manifest::new();
        assert_eq!(manifest.version, 1);
        assert!(manifest.services.contains_key(GLOBAL_SERVICE));
        assert!(manifest.services[GLOBAL_SERVICE].is_empty());
        assert!(manifest.scopes.is_empty());
    }

    #[test]
    fn test_set_and_raw_get() {
        let mut manifest = Manifest::new();
        manifest
            .set_variable("API_KEY", "sk-12345", GLOBAL_SERVICE, None, &policy())
            .unwrap();
        assert_eq!(
            manifest.raw_get("API_KEY", GLOBAL_SERVICE, None),
            Some("sk-12345")
        );
        assert_eq!(manifest.raw_get("API_KEY", "api", None), None);
    }

    #[test]
    fn test_scope_isolation() {
        let mut manifest = Manifest::new();
        manifest
            .set_variable(
                "DB_URL",
                "dev-db",
                GLOBAL_SERVICE,
                Some(Scope::Development),
                &policy(),
            )
            .unwrap();
        manifest
            .set_variable(
                "DB_URL",
                "prod-db",
                GLOBAL_SERVICE,
                Some(Scope::Production),
                &policy(),
            )
            .unwrap();

        assert_eq!(
            manifest.raw_get("DB_URL", GLOBAL_SERVICE, Some(Scope::Development)),
            Some("dev-db")
        );
        assert_eq!(
            manifest.raw_get("DB_URL", GLOBAL_SERVICE, Some(Scope::Production)),
            Some("prod-db")
        );
        assert_eq!(manifest.raw_get("DB_URL", GLOBAL_SERVICE, None), None);
    }

    #[test]
    fn test_remove_reports_change() {
        let mut manifest = Manifest::new();
        manifest
            .set_variable("API_KEY", "v", "api", None, &policy())
            .unwrap();
        assert!(manifest.remove_variable("API_KEY", "api", None));
        assert!(!manifest.remove_variable("API_KEY", "api", None));
        // Emptied non-global bucket is pruned.
        assert!(!manifest.services.contains_key("api"));
    }

    #[test]
    fn test_global_bucket_survives_removal() {
        let mut manifest = Manifest::new();
        manifest
            .set_variable("K", "v", GLOBAL_SERVICE, None, &policy())
            .unwrap();
        assert!(manifest.remove_variable("K", GLOBAL_SERVICE, None));
        assert!(manifest.services.contains_key(GLOBAL_SERVICE));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut manifest = Manifest::new();
        let policy = policy();
        assert!(matches!(
            manifest.set_variable("9BAD", "v", GLOBAL_SERVICE, None, &policy),
            Err(Error::InvalidVariableName { .. })
        ));
        assert!(matches!(
            manifest.set_variable("OK", "v", "-bad", None, &policy),
            Err(Error::InvalidServiceName { .. })
        ));
        assert!(matches!(
            manifest.set_variable("SPACED NAME", "v", GLOBAL_SERVICE, None, &policy),
            Err(Error::InvalidVariableName { .. })
        ));
    }

    #[test]
    fn test_underscore_variable_name_is_valid() {
        let mut manifest = Manifest::new();
        manifest
            .set_variable("_global", "v", GLOBAL_SERVICE, None, &policy())
            .unwrap();
        assert_eq!(
            manifest.raw_get("_global", GLOBAL_SERVICE, None),
            Some("v")
        );
    }

    #[test]
    fn test_policy_rejects_non_matching_value() {
        let mut manifest = Manifest::new();
        let policy = ProjectConfig::from_file(axion_core::config::ProjectConfigFile {
            protected_keys: vec![],
            validation: std::collections::BTreeMap::from([(
                "PORT".to_string(),
                "^[0-9]+$".to_string(),
            )]),
        })
        .unwrap();

        assert!(matches!(
            manifest.set_variable("PORT", "eighty", GLOBAL_SERVICE, None, &policy),
            Err(Error::ValidationFailed { .. })
        ));
        manifest
            .set_variable("PORT", "8080", GLOBAL_SERVICE, None, &policy)
            .unwrap();
    }

    #[test]
    fn test_serde_roundtrip_and_stable_bytes() {
        let mut manifest = Manifest::new();
        let policy = policy();
        manifest
            .set_variable("B", "2", GLOBAL_SERVICE, None, &policy)
            .unwrap();
        manifest
            .set_variable("A", "1", GLOBAL_SERVICE, None, &policy)
            .unwrap();
        manifest
            .set_variable("K", "v", "api", Some(Scope::Staging), &policy)
            .unwrap();

        let bytes = manifest.to_bytes().unwrap();
        let restored = Manifest::from_bytes(&bytes).unwrap();
        assert_eq!(restored, manifest);
        // Identical content serialises to identical bytes.
        assert_eq!(restored.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_legacy_string_revision_accepted() {
        let manifest =
            Manifest::from_bytes(br#"{"version":"1.0","services":{"_global":{}}}"#).unwrap();
        assert_eq!(manifest.version, 1);

        let manifest = Manifest::from_bytes(br#"{"version":"3","services":{}}"#).unwrap();
        assert_eq!(manifest.version, 3);

        // Re-emitted as an integer.
        let out = serde_json::to_value(&manifest).unwrap();
        assert_eq!(out["version"], 3);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("production".parse::<Scope>().unwrap(), Scope::Production);
        assert!(matches!(
            "qa".parse::<Scope>(),
            Err(Error::InvalidScope { .. })
        ));
    }

    #[test]
    fn test_many_keys() {
        let mut manifest = Manifest::new();
        let policy = policy();
        for i in 0..1000 {
            manifest
                .set_variable(&format!("KEY_{i}"), &format!("value-{i}"), GLOBAL_SERVICE, None, &policy)
                .unwrap();
        }
        let restored = Manifest::from_bytes(&manifest.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.services[GLOBAL_SERVICE].len(), 1000);
        assert_eq!(
            restored.raw_get("KEY_999", GLOBAL_SERVICE, None),
            Some("value-999")
        );
    }
}

//! Drift comparison between two decrypted manifests
//!
//! Pure data in, pure data out: three disjoint sets over the default tree
//! and each scope tree. Keys under a scope are reported with a
//! scope-qualified display name (`production/API_KEY`).

use serde::Serialize;

use crate::manifest::{Manifest, ServiceMap};

/// A variable present on one side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftEntry {
    /// Display name, scope-qualified for scoped variables
    pub key: String,
    pub service: String,
    pub value: String,
}

/// A variable present on both sides with different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftModified {
    /// Display name, scope-qualified for scoped variables
    pub key: String,
    pub service: String,
    pub local_value: String,
    pub cloud_value: String,
}

/// The full comparison result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub local_only: Vec<DriftEntry>,
    pub cloud_only: Vec<DriftEntry>,
    pub modified: Vec<DriftModified>,
}

impl DriftReport {
    /// Compare a local manifest against its cloud counterpart.
    pub fn compute(local: &Manifest, cloud: &Manifest) -> Self {
        let mut report = DriftReport::default();

        compare_tier(&local.services, &cloud.services, None, &mut report);

        let mut scopes: Vec<_> = local.scopes.keys().chain(cloud.scopes.keys()).collect();
        scopes.sort();
        scopes.dedup();
        for scope in scopes {
            let empty = ServiceMap::new();
            let local_tier = local.scopes.get(scope).unwrap_or(&empty);
            let cloud_tier = cloud.scopes.get(scope).unwrap_or(&empty);
            compare_tier(local_tier, cloud_tier, Some(scope.as_str()), &mut report);
        }

        report
    }

    /// Whether the two manifests carry identical content.
    pub fn is_clean(&self) -> bool {
        self.local_only.is_empty() && self.cloud_only.is_empty() && self.modified.is_empty()
    }

    /// Total number of differing entries.
    pub fn len(&self) -> usize {
        self.local_only.len() + self.cloud_only.len() + self.modified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

fn compare_tier(
    local: &ServiceMap,
    cloud: &ServiceMap,
    scope: Option<&str>,
    report: &mut DriftReport,
) {
    let mut services: Vec<_> = local.keys().chain(cloud.keys()).collect();
    services.sort();
    services.dedup();

    for service in services {
        let local_vars = local.get(service);
        let cloud_vars = cloud.get(service);

        let mut keys: Vec<_> = local_vars
            .into_iter()
            .flat_map(|m| m.keys())
            .chain(cloud_vars.into_iter().flat_map(|m| m.keys()))
            .collect();
        keys.sort();
        keys.dedup();

        for key in keys {
            let display = match scope {
                Some(scope) => format!("{scope}/{key}"),
                None => key.clone(),
            };
            let local_value = local_vars.and_then(|m| m.get(key));
            let cloud_value = cloud_vars.and_then(|m| m.get(key));

            match (local_value, cloud_value) {
                (Some(l), None) => report.local_only.push(DriftEntry {
                    key: display,
                    service: service.clone(),
                    value: l.clone(),
                }),
                (None, Some(c)) => report.cloud_only.push(DriftEntry {
                    key: display,
                    service: service.clone(),
                    value: c.clone(),
                }),
                (Some(l), Some(c)) if l != c => report.modified.push(DriftModified {
                    key: display,
                    service: service.clone(),
                    local_value: l.clone(),
                    cloud_value: c.clone(),
                }),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Scope, GLOBAL_SERVICE};
    use axion_core::config::ProjectConfig;

    fn manifest(entries: &[(&str, &str, &str, Option<Scope>)]) -> Manifest {
        let mut manifest = Manifest::new();
        let policy = ProjectConfig::default();
        for (key, value, service, scope) in entries {
            manifest
                .set_variable(key, value, service, *scope, &policy)
                .unwrap();
        }
        manifest
    }

    #[test]
    fn test_identical_manifests_are_clean() {
        let local = manifest(&[("A", "1", GLOBAL_SERVICE, None)]);
        let report = DriftReport::compute(&local, &local.clone());
        assert!(report.is_clean());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn test_three_sets_are_disjoint() {
        let local = manifest(&[
            ("ONLY_LOCAL", "l", GLOBAL_SERVICE, None),
            ("SHARED", "same", GLOBAL_SERVICE, None),
            ("CHANGED", "local-v", GLOBAL_SERVICE, None),
        ]);
        let cloud = manifest(&[
            ("ONLY_CLOUD", "c", GLOBAL_SERVICE, None),
            ("SHARED", "same", GLOBAL_SERVICE, None),
            ("CHANGED", "cloud-v", GLOBAL_SERVICE, None),
        ]);

        let report = DriftReport::compute(&local, &cloud);
        assert_eq!(report.local_only.len(), 1);
        assert_eq!(report.local_only[0].key, "ONLY_LOCAL");
        assert_eq!(report.cloud_only.len(), 1);
        assert_eq!(report.cloud_only[0].key, "ONLY_CLOUD");
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.modified[0].local_value, "local-v");
        assert_eq!(report.modified[0].cloud_value, "cloud-v");
    }

    #[test]
    fn test_scope_entries_get_qualified_names() {
        let local = manifest(&[("DB_URL", "prod-db", "api", Some(Scope::Production))]);
        let cloud = Manifest::new();

        let report = DriftReport::compute(&local, &cloud);
        assert_eq!(report.local_only.len(), 1);
        assert_eq!(report.local_only[0].key, "production/DB_URL");
        assert_eq!(report.local_only[0].service, "api");
    }

    #[test]
    fn test_scope_only_on_cloud_side() {
        let local = Manifest::new();
        let cloud = manifest(&[("FLAG", "on", GLOBAL_SERVICE, Some(Scope::Staging))]);

        let report = DriftReport::compute(&local, &cloud);
        assert_eq!(report.cloud_only.len(), 1);
        assert_eq!(report.cloud_only[0].key, "staging/FLAG");
    }

    #[test]
    fn test_same_key_in_default_and_scope_compared_separately() {
        let local = manifest(&[
            ("K", "default-l", GLOBAL_SERVICE, None),
            ("K", "scoped-l", GLOBAL_SERVICE, Some(Scope::Development)),
        ]);
        let cloud = manifest(&[
            ("K", "default-l", GLOBAL_SERVICE, None),
            ("K", "scoped-c", GLOBAL_SERVICE, Some(Scope::Development)),
        ]);

        let report = DriftReport::compute(&local, &cloud);
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.modified[0].key, "development/K");
    }

    #[test]
    fn test_empty_manifests() {
        let report = DriftReport::compute(&Manifest::new(), &Manifest::new());
        assert!(report.is_clean());
    }
}

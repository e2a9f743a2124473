//! In-process SDK surface
//!
//! A process-local cache keyed by `(work_dir, service, scope)` in front of
//! the full read path (arbiter load → resolution). `get_secrets` hands out
//! defensive copies; `load_secrets` writes into the ambient process
//! environment; `create_client` binds the three coordinates for repeated
//! lookups. `clear_cache` / `clear_cache_for` are the documented teardown.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use tokio::sync::RwLock;

use axion_core::error::Result;

use crate::engine::SecretsEngine;
use crate::manifest::{Scope, VariableMap, GLOBAL_SERVICE};
use crate::sync::SyncArbiter;

/// Coordinates of one secrets view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretOptions {
    pub work_dir: PathBuf,
    pub service: String,
    pub scope: Option<Scope>,
}

impl SecretOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            service: GLOBAL_SERVICE.to_string(),
            scope: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    fn cache_key(&self) -> CacheKey {
        (
            self.work_dir.clone(),
            self.service.clone(),
            self.scope,
        )
    }
}

type CacheKey = (PathBuf, String, Option<Scope>);

fn cache() -> &'static RwLock<HashMap<CacheKey, VariableMap>> {
    static CACHE: OnceLock<RwLock<HashMap<CacheKey, VariableMap>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

async fn resolve_uncached(opts: &SecretOptions) -> Result<VariableMap> {
    let engine = SecretsEngine::new(&opts.work_dir)?;
    let arbiter = SyncArbiter::for_project(engine, env!("CARGO_PKG_VERSION"));
    let manifest = arbiter.load().await?;
    arbiter
        .engine()
        .variables(&manifest, &opts.service, opts.scope)
        .await
}

/// Resolved secrets for the given coordinates, from cache when warm.
/// The returned map is a defensive copy.
pub async fn get_secrets(opts: &SecretOptions) -> Result<VariableMap> {
    let key = opts.cache_key();
    if let Some(hit) = cache().read().await.get(&key) {
        return Ok(hit.clone());
    }

    let resolved = resolve_uncached(opts).await?;
    cache().write().await.insert(key, resolved.clone());
    Ok(resolved)
}

/// Write resolved secrets into the process environment. Pre-existing
/// variables are preserved unless `overwrite` is set. Returns the number
/// of variables written.
pub async fn load_secrets(opts: &SecretOptions, overwrite: bool) -> Result<usize> {
    let secrets = get_secrets(opts).await?;
    let mut written = 0;
    for (key, value) in &secrets {
        if overwrite || std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
            written += 1;
        }
    }
    Ok(written)
}

/// Drop every cached entry.
pub async fn clear_cache() {
    cache().write().await.clear();
}

/// Drop the cached entry for one set of coordinates.
pub async fn clear_cache_for(opts: &SecretOptions) {
    cache().write().await.remove(&opts.cache_key());
}

/// A client bound to one set of coordinates.
pub struct SecretsClient {
    opts: SecretOptions,
}

/// Bind a client to the given coordinates.
pub fn create_client(opts: SecretOptions) -> SecretsClient {
    SecretsClient { opts }
}

impl SecretsClient {
    pub fn options(&self) -> &SecretOptions {
        &self.opts
    }

    /// One variable, or `None` when unset.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(get_secrets(&self.opts).await?.get(key).cloned())
    }

    /// The full resolved map (defensive copy).
    pub async fn get_all(&self) -> Result<VariableMap> {
        get_secrets(&self.opts).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(get_secrets(&self.opts).await?.contains_key(key))
    }

    /// Invalidate and re-resolve, atomically replacing the cached value.
    pub async fn reload(&self) -> Result<VariableMap> {
        let resolved = resolve_uncached(&self.opts).await?;
        cache()
            .write()
            .await
            .insert(self.opts.cache_key(), resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axion_core::envelope::KdfParams;
    use tempfile::TempDir;

    async fn project(values: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let engine = SecretsEngine::new(tmp.path())
            .unwrap()
            .with_kdf_params(KdfParams::insecure_for_tests());
        engine.init().await.unwrap();

        let mut manifest = engine.load_local().await.unwrap();
        for (key, value) in values {
            engine
                .set_variable(&mut manifest, key, value, GLOBAL_SERVICE, None)
                .unwrap();
        }
        engine.save_local(&manifest).await.unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_get_secrets_and_cache() {
        let tmp = project(&[("CACHED_KEY", "v1")]).await;
        let opts = SecretOptions::new(tmp.path());

        let first = get_secrets(&opts).await.unwrap();
        assert_eq!(first["CACHED_KEY"], "v1");

        // Mutate the manifest behind the cache; the stale copy is served.
        let engine = SecretsEngine::new(tmp.path())
            .unwrap()
            .with_kdf_params(KdfParams::insecure_for_tests());
        let mut manifest = engine.load_local().await.unwrap();
        engine
            .set_variable(&mut manifest, "CACHED_KEY", "v2", GLOBAL_SERVICE, None)
            .unwrap();
        engine.save_local(&manifest).await.unwrap();

        let cached = get_secrets(&opts).await.unwrap();
        assert_eq!(cached["CACHED_KEY"], "v1");

        // Invalidation picks up the new value.
        clear_cache_for(&opts).await;
        let fresh = get_secrets(&opts).await.unwrap();
        assert_eq!(fresh["CACHED_KEY"], "v2");
    }

    #[tokio::test]
    async fn test_defensive_copy() {
        let tmp = project(&[("COPY_KEY", "original")]).await;
        let opts = SecretOptions::new(tmp.path());

        let mut copy = get_secrets(&opts).await.unwrap();
        copy.insert("COPY_KEY".to_string(), "mutated".to_string());

        let again = get_secrets(&opts).await.unwrap();
        assert_eq!(again["COPY_KEY"], "original");
    }

    #[tokio::test]
    async fn test_client_roundtrip() {
        let tmp = project(&[("CLIENT_KEY", "cv")]).await;
        let client = create_client(SecretOptions::new(tmp.path()));

        assert_eq!(client.get("CLIENT_KEY").await.unwrap().as_deref(), Some("cv"));
        assert!(client.has("CLIENT_KEY").await.unwrap());
        assert!(!client.has("ABSENT").await.unwrap());
        assert_eq!(client.get_all().await.unwrap()["CLIENT_KEY"], "cv");
    }

    #[tokio::test]
    async fn test_client_reload_replaces_cache() {
        let tmp = project(&[("RELOAD_KEY", "before")]).await;
        let client = create_client(SecretOptions::new(tmp.path()));
        assert_eq!(
            client.get("RELOAD_KEY").await.unwrap().as_deref(),
            Some("before")
        );

        let engine = SecretsEngine::new(tmp.path())
            .unwrap()
            .with_kdf_params(KdfParams::insecure_for_tests());
        let mut manifest = engine.load_local().await.unwrap();
        engine
            .set_variable(&mut manifest, "RELOAD_KEY", "after", GLOBAL_SERVICE, None)
            .unwrap();
        engine.save_local(&manifest).await.unwrap();

        let reloaded = client.reload().await.unwrap();
        assert_eq!(reloaded["RELOAD_KEY"], "after");
        assert_eq!(
            client.get("RELOAD_KEY").await.unwrap().as_deref(),
            Some("after")
        );
    }

    #[tokio::test]
    async fn test_load_secrets_preserves_existing_env() {
        let tmp = project(&[
            ("AXION_SDK_TEST_EXISTING", "from-manifest"),
            ("AXION_SDK_TEST_FRESH", "fresh"),
        ])
        .await;
        let opts = SecretOptions::new(tmp.path());

        std::env::set_var("AXION_SDK_TEST_EXISTING", "ambient");
        load_secrets(&opts, false).await.unwrap();
        assert_eq!(
            std::env::var("AXION_SDK_TEST_EXISTING").unwrap(),
            "ambient"
        );
        assert_eq!(std::env::var("AXION_SDK_TEST_FRESH").unwrap(), "fresh");

        // With overwrite, the manifest value wins.
        load_secrets(&opts, true).await.unwrap();
        assert_eq!(
            std::env::var("AXION_SDK_TEST_EXISTING").unwrap(),
            "from-manifest"
        );

        std::env::remove_var("AXION_SDK_TEST_EXISTING");
        std::env::remove_var("AXION_SDK_TEST_FRESH");
    }

    #[tokio::test]
    async fn test_scoped_cache_entries_are_distinct() {
        let tmp = TempDir::new().unwrap();
        let engine = SecretsEngine::new(tmp.path())
            .unwrap()
            .with_kdf_params(KdfParams::insecure_for_tests());
        engine.init().await.unwrap();
        let mut manifest = engine.load_local().await.unwrap();
        engine
            .set_variable(&mut manifest, "DB", "dev", GLOBAL_SERVICE, Some(Scope::Development))
            .unwrap();
        engine
            .set_variable(&mut manifest, "DB", "prod", GLOBAL_SERVICE, Some(Scope::Production))
            .unwrap();
        engine.save_local(&manifest).await.unwrap();

        let dev = SecretOptions::new(tmp.path()).with_scope(Scope::Development);
        let prod = SecretOptions::new(tmp.path()).with_scope(Scope::Production);
        assert_eq!(get_secrets(&dev).await.unwrap()["DB"], "dev");
        assert_eq!(get_secrets(&prod).await.unwrap()["DB"], "prod");
    }
}

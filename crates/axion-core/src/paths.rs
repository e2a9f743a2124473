//! On-disk layout
//!
//! Project-local state lives under `<work_dir>/.axion/`; user-global state
//! under `~/.axion/`. Every consumer takes an explicit working directory so
//! tests can sandbox a project without touching the process CWD.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Project-local configuration directory name.
pub const PROJECT_DIR: &str = ".axion";

/// Path layout for a single project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    work_dir: PathBuf,
    config_dir: PathBuf,
}

impl ProjectPaths {
    /// Bind the layout to a working directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let config_dir = work_dir.join(PROJECT_DIR);
        Self {
            work_dir,
            config_dir,
        }
    }

    /// The project working directory this layout is bound to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The `.axion` configuration directory.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Project key file (32 hex chars + newline, mode 0600).
    pub fn key_path(&self) -> PathBuf {
        self.config_dir.join("key")
    }

    /// Encrypted manifest envelope.
    pub fn manifest_path(&self) -> PathBuf {
        self.config_dir.join("manifest.enc")
    }

    /// Rotation backup sibling of the manifest.
    pub fn manifest_backup_path(&self) -> PathBuf {
        self.config_dir.join("manifest.enc.backup")
    }

    /// Cloud link record.
    pub fn cloud_path(&self) -> PathBuf {
        self.config_dir.join("cloud.json")
    }

    /// Project policy configuration.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.yaml")
    }

    /// Local-only overrides, never uploaded.
    pub fn overrides_path(&self) -> PathBuf {
        self.config_dir.join("overrides.env")
    }

    /// Create the configuration directory with owner-only permissions.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
            set_mode(&self.config_dir, 0o700)?;
        }
        Ok(())
    }
}

/// User-global Axion directory (`~/.axion`), created `0700` on first use.
pub fn user_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Io(std::io::Error::other("home directory not found")))?;
    let dir = home.join(PROJECT_DIR);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_mode(&dir, 0o700)?;
    }
    Ok(dir)
}

/// User credentials file.
pub fn credentials_path() -> Result<PathBuf> {
    Ok(user_dir()?.join("credentials.json"))
}

/// Persistent device identifier file.
pub fn device_id_path() -> Result<PathBuf> {
    Ok(user_dir()?.join("device-id"))
}

/// Write a file atomically: stage in a temporary sibling, set permissions,
/// then rename into place.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Io(std::io::Error::other("path has no parent directory")))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, contents)?;
    if let Some(mode) = mode {
        set_mode(tmp.path(), mode)?;
    }
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Set Unix permissions; a no-op elsewhere.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = ProjectPaths::new("/tmp/project");
        assert_eq!(paths.key_path(), PathBuf::from("/tmp/project/.axion/key"));
        assert_eq!(
            paths.manifest_path(),
            PathBuf::from("/tmp/project/.axion/manifest.enc")
        );
        assert_eq!(
            paths.manifest_backup_path(),
            PathBuf::from("/tmp/project/.axion/manifest.enc.backup")
        );
    }

    #[test]
    fn test_ensure_dir_creates_private_directory() {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::new(tmp.path());
        paths.ensure_dir().unwrap();
        assert!(paths.config_dir().is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(paths.config_dir()).unwrap().permissions();
            assert_eq!(mode.mode() & 0o777, 0o700);
        }
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file");
        write_atomic(&path, b"first", Some(0o600)).unwrap();
        write_atomic(&path, b"second", Some(0o600)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions();
            assert_eq!(mode.mode() & 0o777, 0o600);
        }
    }
}

//! Test data configuration.
//!
//! The default cache directory and branch tag are shared by every open in a
//! session. They are carried explicitly in [`TestDataConfig`] instead of
//! living in process globals.

use crate::error::{Result, TestingError};
use crate::opener::Engine;
use std::path::PathBuf;

/// Default testdata corpus version.
pub const TESTDATA_BRANCH: &str = "v2024.8.23";

/// Environment variable overriding the testdata branch.
pub const ENV_BRANCH: &str = "XCLIM_TESTDATA_BRANCH";
/// Environment variable overriding the default cache directory.
pub const ENV_CACHE_DIR: &str = "XCLIM_TESTDATA_CACHE_DIR";
/// Environment variable pointing at a local checkout of the testdata corpus.
pub const ENV_MIRROR: &str = "XCLIM_TESTDATA_MIRROR";

/// Configuration shared by all fixtures of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDataConfig {
    /// Pre-existing cache of downloaded reference datasets.
    pub default_cache_dir: PathBuf,
    /// Branch/version tag of the reference corpus.
    pub branch: String,
    /// Local corpus checkout used to populate missing files.
    pub mirror: Option<PathBuf>,
    /// Engine applied by the scoped accessor when callers don't pick one.
    pub default_engine: Engine,
}

impl TestDataConfig {
    /// Create a configuration with the default branch and engine.
    pub fn new(default_cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_cache_dir: default_cache_dir.into(),
            branch: TESTDATA_BRANCH.to_string(),
            mirror: None,
            default_engine: Engine::H5Netcdf,
        }
    }

    /// Build a configuration from `XCLIM_TESTDATA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let cache_dir = match std::env::var_os(ENV_CACHE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_cache_dir()?,
        };

        let mut config = Self::new(cache_dir);
        if let Ok(branch) = std::env::var(ENV_BRANCH) {
            if !branch.is_empty() {
                config.branch = branch;
            }
        }
        config.mirror = std::env::var_os(ENV_MIRROR).map(PathBuf::from);
        Ok(config)
    }

    /// Override the branch tag.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the local corpus mirror.
    pub fn with_mirror(mut self, mirror: impl Into<PathBuf>) -> Self {
        self.mirror = Some(mirror.into());
        self
    }

    /// Warnings that apply to a test run with this configuration.
    pub fn setup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.branch != TESTDATA_BRANCH {
            warnings.push(format!(
                "Running tests against testdata branch '{}' instead of '{}'. \
                 Results may differ from the reference outputs.",
                self.branch, TESTDATA_BRANCH
            ));
        }

        if !self.default_cache_dir.exists() {
            warnings.push(format!(
                "Default cache directory {} does not exist; copying it into the session directory will fail.",
                self.default_cache_dir.display()
            ));
        }

        if self.mirror.is_none() {
            warnings.push(format!(
                "{} is not set; files missing from the cache cannot be retrieved.",
                ENV_MIRROR
            ));
        }

        warnings
    }

    /// Emit [`Self::setup_warnings`] through `tracing`.
    pub fn emit_setup_warnings(&self) {
        for warning in self.setup_warnings() {
            tracing::warn!("{}", warning);
        }
    }
}

/// Platform cache location for the testdata corpus.
pub fn default_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or(TestingError::NoCacheDir)?;
    Ok(cache_dir.join("xclim-testdata"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_branch() {
        let config = TestDataConfig::new("/tmp/cache");
        assert_eq!(config.branch, TESTDATA_BRANCH);
        assert_eq!(config.default_engine, Engine::H5Netcdf);
        assert!(config.mirror.is_none());
    }

    #[test]
    fn test_non_default_branch_warns() {
        let dir = tempfile::tempdir().unwrap();
        let config = TestDataConfig::new(dir.path())
            .with_branch("main")
            .with_mirror(dir.path());

        let warnings = config.setup_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'main'"));
    }

    #[test]
    fn test_default_configuration_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let config = TestDataConfig::new(dir.path()).with_mirror(dir.path());
        assert!(config.setup_warnings().is_empty());
    }

    #[test]
    fn test_missing_cache_dir_warns() {
        let dir = tempfile::tempdir().unwrap();
        let config = TestDataConfig::new(dir.path().join("absent")).with_mirror(dir.path());
        let warnings = config.setup_warnings();
        let warning = warnings
            .iter()
            .find(|w| w.contains("does not exist"))
            .unwrap();
        assert!(warning.contains("will fail"));
        assert!(!warning.contains("fetched"));
    }
}

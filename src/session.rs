//! Session-scoped test data.
//!
//! A [`Session`] owns one temporary root per documentation test run. The
//! data directory under it is shared by every fixture of the session, and
//! [`Session::bootstrap`] fills it and builds the namespace handed to the
//! examples.

use crate::atmos;
use crate::config::TestDataConfig;
use crate::data::DatasetHandle;
use crate::error::{Result, SetupStage, TestingError};
use crate::namespace::{self, DoctestNamespace, Entry, XrModule};
use crate::opener::{CachingOpener, DatasetOpener, Engine, MirrorFetch, NoFetch, OpenOptions};
use crate::probe::{self, PLOTTING_PROBE};
use crate::util;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;

/// Dataset-opening callable bound to a cache directory and branch.
#[derive(Debug, Clone)]
pub struct ScopedOpener {
    opener: Arc<dyn DatasetOpener>,
    cache_dir: PathBuf,
    branch: String,
    default_engine: Option<Engine>,
}

impl ScopedOpener {
    /// Bind `opener` to `cache_dir` and `branch`.
    ///
    /// With `default_engine` set, opens that don't choose an engine get it.
    pub fn new(
        opener: Arc<dyn DatasetOpener>,
        cache_dir: impl Into<PathBuf>,
        branch: impl Into<String>,
        default_engine: Option<Engine>,
    ) -> Self {
        Self {
            opener,
            cache_dir: cache_dir.into(),
            branch: branch.into(),
            default_engine,
        }
    }

    /// Cache directory every open resolves against.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Default branch tag.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Open `file` from the default branch.
    pub fn open(&self, file: impl AsRef<Path>) -> Result<DatasetHandle> {
        self.open_with(file, None, OpenOptions::default())
    }

    /// Open `file`, optionally from another branch and with explicit options.
    pub fn open_with(
        &self,
        file: impl AsRef<Path>,
        branch: Option<&str>,
        options: OpenOptions,
    ) -> Result<DatasetHandle> {
        let options = match self.default_engine {
            Some(engine) => options.or_engine(engine),
            None => options,
        };
        let branch = branch.unwrap_or(&self.branch);
        self.opener
            .open(file.as_ref(), &self.cache_dir, branch, &options)
    }
}

enum SessionRoot {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl SessionRoot {
    fn path(&self) -> &Path {
        match self {
            SessionRoot::Temp(dir) => dir.path(),
            SessionRoot::Fixed(path) => path,
        }
    }
}

/// One documentation test session.
pub struct Session {
    root: SessionRoot,
    config: TestDataConfig,
    opener: Arc<dyn DatasetOpener>,
    data_dir: OnceLock<PathBuf>,
    namespace: OnceLock<DoctestNamespace>,
    bootstrap_lock: Mutex<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root.path())
            .field("config", &self.config)
            .field("bootstrapped", &self.namespace.get().is_some())
            .finish()
    }
}

impl Session {
    /// Start a session rooted in a fresh temporary directory.
    ///
    /// The directory is removed when the session is dropped.
    pub fn new(config: TestDataConfig) -> Result<Self> {
        let root = tempfile::Builder::new().prefix("xclim-session-").tempdir()?;
        Ok(Self::with_root(SessionRoot::Temp(root), config))
    }

    /// Start a session rooted at a caller-owned directory that is kept afterwards.
    pub fn in_root(root: impl Into<PathBuf>, config: TestDataConfig) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self::with_root(SessionRoot::Fixed(root), config))
    }

    fn with_root(root: SessionRoot, config: TestDataConfig) -> Self {
        let opener: Arc<dyn DatasetOpener> = match &config.mirror {
            Some(mirror) => Arc::new(
                CachingOpener::new(MirrorFetch::new(mirror)).with_flat_branch(config.branch.clone()),
            ),
            None => Arc::new(CachingOpener::new(NoFetch).with_flat_branch(config.branch.clone())),
        };
        Self {
            root,
            config,
            opener,
            data_dir: OnceLock::new(),
            namespace: OnceLock::new(),
            bootstrap_lock: Mutex::new(()),
        }
    }

    /// Replace the dataset opener. Takes effect for accessors built afterwards.
    pub fn with_opener(mut self, opener: Arc<dyn DatasetOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Session configuration.
    pub fn config(&self) -> &TestDataConfig {
        &self.config
    }

    /// Temporary root of the session.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Shared data directory, created on first use.
    ///
    /// Every call within a session returns the same path.
    pub fn data_dir(&self) -> Result<&Path> {
        if let Some(dir) = self.data_dir.get() {
            return Ok(dir);
        }
        let dir = self.root.path().join("data");
        fs::create_dir_all(&dir)?;
        Ok(self.data_dir.get_or_init(|| dir))
    }

    /// Dataset accessor bound to the session directory and default branch.
    ///
    /// Opens without an explicit engine use the configured default engine.
    pub fn open_dataset_fn(&self) -> Result<ScopedOpener> {
        Ok(ScopedOpener::new(
            Arc::clone(&self.opener),
            self.data_dir()?,
            self.config.branch.clone(),
            Some(self.config.default_engine),
        ))
    }

    /// Namespace for documentation examples, built on first call.
    ///
    /// Later calls return the same namespace without touching the data
    /// directory again. A failed bootstrap leaves the session without a
    /// namespace.
    pub fn bootstrap(&self) -> Result<&DoctestNamespace> {
        let _guard = self
            .bootstrap_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(namespace) = self.namespace.get() {
            return Ok(namespace);
        }

        let namespace = self.build_namespace()?;
        Ok(self.namespace.get_or_init(|| namespace))
    }

    fn build_namespace(&self) -> Result<DoctestNamespace> {
        let data_dir = self
            .data_dir()
            .map_err(|e| TestingError::setup(SetupStage::DataDir, e))?;
        tracing::info!("Bootstrapping doctest session in {}", data_dir.display());

        self.config.emit_setup_warnings();

        util::copy_tree(&self.config.default_cache_dir, data_dir)
            .map_err(|e| TestingError::setup(SetupStage::CopyCache, e))?;
        atmos::generate_atmos(data_dir)
            .map_err(|e| TestingError::setup(SetupStage::GenerateAtmos, e))?;

        let mut ns = DoctestNamespace::new();
        ns.insert(PLOTTING_PROBE, Entry::Probe(probe::plotting().probe()));

        // Options pass through untouched, only cache dir and branch are pinned
        let opener = ScopedOpener::new(
            Arc::clone(&self.opener),
            data_dir,
            self.config.branch.clone(),
            None,
        );
        ns.insert("open_dataset", Entry::Opener(opener.clone()));
        ns.insert("xr", Entry::Module(XrModule { open_dataset: opener }));
        ns.extend(namespace::doctest_filepaths());

        // Generation is idempotent, this pass only rewrites the same file
        atmos::generate_atmos(data_dir)
            .map_err(|e| TestingError::setup(SetupStage::GenerateAtmos, e))?;
        ns.extend(namespace::example_file_paths(data_dir, &self.config.branch));

        tracing::info!("Doctest namespace ready with {} entries", ns.len());
        Ok(ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct RecordingOpener {
        calls: AtomicUsize,
        last: Mutex<Option<(PathBuf, PathBuf, String, OpenOptions)>>,
    }

    impl DatasetOpener for RecordingOpener {
        fn open(
            &self,
            file: &Path,
            cache_dir: &Path,
            branch: &str,
            options: &OpenOptions,
        ) -> Result<DatasetHandle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((
                file.to_path_buf(),
                cache_dir.to_path_buf(),
                branch.to_string(),
                options.clone(),
            ));
            Err(TestingError::not_found(file, branch))
        }
    }

    fn config() -> (TempDir, TestDataConfig) {
        let cache = tempfile::tempdir().unwrap();
        let config = TestDataConfig::new(cache.path()).with_branch("v-test");
        (cache, config)
    }

    #[test]
    fn test_data_dir_is_stable() {
        let (_cache, config) = config();
        let session = Session::new(config).unwrap();
        let first = session.data_dir().unwrap().to_path_buf();
        let second = session.data_dir().unwrap().to_path_buf();
        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(first.starts_with(session.root()));
    }

    #[test]
    fn test_scoped_opener_applies_default_engine() {
        let (_cache, config) = config();
        let recorder = Arc::new(RecordingOpener::default());
        let session = Session::new(config).unwrap().with_opener(recorder.clone());

        let open = session.open_dataset_fn().unwrap();
        let _ = open.open("foo.nc");

        let (file, cache_dir, branch, options) = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(file, PathBuf::from("foo.nc"));
        assert_eq!(cache_dir, session.data_dir().unwrap());
        assert_eq!(branch, "v-test");
        assert_eq!(options.engine, Some(Engine::H5Netcdf));
    }

    #[test]
    fn test_scoped_opener_keeps_caller_choices() {
        let (_cache, config) = config();
        let recorder = Arc::new(RecordingOpener::default());
        let session = Session::new(config).unwrap().with_opener(recorder.clone());

        let open = session.open_dataset_fn().unwrap();
        let err = open
            .open_with(
                "foo.nc",
                Some("main"),
                OpenOptions::default().with_engine(Engine::Netcdf4),
            )
            .unwrap_err();
        assert!(matches!(err, TestingError::NotFound { .. }));

        let (_, _, branch, options) = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(branch, "main");
        assert_eq!(options.engine, Some(Engine::Netcdf4));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let (_cache, config) = config();
        let session = Session::new(config).unwrap();

        let first = session.bootstrap().unwrap() as *const DoctestNamespace;
        let second = session.bootstrap().unwrap() as *const DoctestNamespace;
        assert_eq!(first, second);
    }

    #[test]
    fn test_bootstrap_fails_without_default_cache() {
        let cache = tempfile::tempdir().unwrap();
        let config = TestDataConfig::new(cache.path().join("absent"));
        let session = Session::new(config).unwrap();

        let err = session.bootstrap().unwrap_err();
        assert!(matches!(
            err,
            TestingError::Setup { stage: SetupStage::CopyCache, .. }
        ));
        assert!(!session.data_dir().unwrap().join(atmos::ATMOS_FILE).exists());
    }

    #[test]
    fn test_fixed_root_is_kept() {
        let (_cache, config) = config();
        let root = tempfile::tempdir().unwrap();
        let session_root = root.path().join("session");
        {
            let session = Session::in_root(&session_root, config).unwrap();
            session.bootstrap().unwrap();
        }
        assert!(session_root.join("data").join(atmos::ATMOS_FILE).is_file());
    }

    #[test]
    fn test_concurrent_bootstrap_shares_one_namespace() {
        let (_cache, config) = config();
        let session = Session::new(config).unwrap();

        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| session.bootstrap().unwrap() as *const DoctestNamespace as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));

        let names: Vec<String> = fs::read_dir(session.data_dir().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.iter().filter(|n| *n == atmos::ATMOS_FILE).count(), 1);
        assert!(names.iter().all(|n| !n.starts_with(".tmp-")), "leftovers: {:?}", names);
    }

    #[test]
    fn test_bootstrap_reports_data_dir_failure() {
        let (_cache, config) = config();
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("data"), b"not a directory").unwrap();
        let session = Session::in_root(root.path(), config).unwrap();

        let err = session.bootstrap().unwrap_err();
        assert!(matches!(
            err,
            TestingError::Setup { stage: SetupStage::DataDir, .. }
        ));
        assert!(err.to_string().contains("create session data directory"));
    }
}

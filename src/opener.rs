//! Dataset openers.
//!
//! A [`DatasetOpener`] resolves a file identifier against a cache directory
//! and branch, and returns a [`DatasetHandle`]. [`CachingOpener`] is the
//! standard implementation: it looks the file up in the cache and asks its
//! [`Fetch`] backend to populate the cache only when the file is missing.

use crate::data::{DataReader, DatasetHandle};
use crate::error::{Result, TestingError};
use crate::util;
use std::fmt;
use std::path::{Path, PathBuf};

/// Engine requested for a dataset.
///
/// Every engine is read through the netCDF library. The choice does not
/// change how a file is decoded and is only recorded on the returned handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// HDF5-backed NetCDF4 reading.
    H5Netcdf,
    /// NetCDF C library reading.
    Netcdf4,
}

impl Engine {
    /// Engine name as used in example code.
    pub fn name(self) -> &'static str {
        match self {
            Engine::H5Netcdf => "h5netcdf",
            Engine::Netcdf4 => "netcdf4",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "h5netcdf" => Ok(Engine::H5Netcdf),
            "netcdf4" => Ok(Engine::Netcdf4),
            other => Err(format!("unknown engine '{}'", other)),
        }
    }
}

/// Options forwarded to the opener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Engine selector; `None` lets the opener decide.
    pub engine: Option<Engine>,
}

impl OpenOptions {
    /// Select an engine.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the engine unless one was already chosen.
    pub fn or_engine(mut self, engine: Engine) -> Self {
        self.engine.get_or_insert(engine);
        self
    }
}

/// Opens datasets out of a cache directory.
pub trait DatasetOpener: Send + Sync + fmt::Debug {
    /// Open `file` from the `branch` corpus, caching under `cache_dir`.
    fn open(
        &self,
        file: &Path,
        cache_dir: &Path,
        branch: &str,
        options: &OpenOptions,
    ) -> Result<DatasetHandle>;
}

/// Populates a cache with a corpus file.
pub trait Fetch: Send + Sync + fmt::Debug {
    /// Place `file` from the `branch` corpus at `dest`.
    fn fetch(&self, file: &Path, branch: &str, dest: &Path) -> Result<()>;
}

/// Fetch backend for offline runs: every missing file is a resolution failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetch;

impl Fetch for NoFetch {
    fn fetch(&self, file: &Path, branch: &str, _dest: &Path) -> Result<()> {
        Err(TestingError::not_found(file, branch))
    }
}

/// Fetch backend copying from a local checkout of the testdata corpus.
///
/// The checkout is laid out as `<root>/<branch>/<file>`.
#[derive(Debug, Clone)]
pub struct MirrorFetch {
    root: PathBuf,
}

impl MirrorFetch {
    /// Create a mirror backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for MirrorFetch {
    fn fetch(&self, file: &Path, branch: &str, dest: &Path) -> Result<()> {
        let source = self.root.join(branch).join(file);
        if !source.is_file() {
            return Err(TestingError::not_found(file, branch));
        }
        tracing::info!("Fetching {} from mirror {}", file.display(), self.root.display());
        util::atomic_copy(&source, dest)
    }
}

/// Cache-first opener.
///
/// Files stored directly under the cache directory (the copied default
/// cache and the generated `atmosds.nc`) belong to one branch, set with
/// [`CachingOpener::with_flat_branch`]. Other branches only see their own
/// `<cache>/<branch>` directory.
#[derive(Debug, Clone, Default)]
pub struct CachingOpener<F = NoFetch> {
    fetcher: F,
    flat_branch: Option<String>,
}

impl<F: Fetch> CachingOpener<F> {
    /// Create an opener backed by `fetcher`.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            flat_branch: None,
        }
    }

    /// Let `branch` resolve files stored directly under the cache directory.
    pub fn with_flat_branch(mut self, branch: impl Into<String>) -> Self {
        self.flat_branch = Some(branch.into());
        self
    }

    /// Locate `file` in the cache without fetching.
    ///
    /// Absolute paths win, then `<cache>/<branch>/<file>`, then `<cache>/<file>`
    /// when `branch` is the flat branch.
    pub fn resolve_cached(&self, file: &Path, cache_dir: &Path, branch: &str) -> Option<PathBuf> {
        if file.is_absolute() {
            return file.is_file().then(|| file.to_path_buf());
        }

        let branch_path = cache_dir.join(branch).join(file);
        if branch_path.is_file() {
            return Some(branch_path);
        }
        if self.flat_branch.as_deref() != Some(branch) {
            return None;
        }
        let flat_path = cache_dir.join(file);
        flat_path.is_file().then_some(flat_path)
    }

    /// Resolve `file`, fetching it into the branch directory when missing.
    pub fn resolve(&self, file: &Path, cache_dir: &Path, branch: &str) -> Result<PathBuf> {
        if let Some(path) = self.resolve_cached(file, cache_dir, branch) {
            tracing::debug!("Cache hit for {}: {}", file.display(), path.display());
            return Ok(path);
        }
        if file.is_absolute() {
            return Err(TestingError::not_found(file, branch));
        }

        let dest = cache_dir.join(branch).join(file);
        tracing::debug!("Cache miss for {}, fetching into {}", file.display(), dest.display());
        self.fetcher.fetch(file, branch, &dest)?;
        Ok(dest)
    }
}

impl<F: Fetch> DatasetOpener for CachingOpener<F> {
    fn open(
        &self,
        file: &Path,
        cache_dir: &Path,
        branch: &str,
        options: &OpenOptions,
    ) -> Result<DatasetHandle> {
        let path = self.resolve(file, cache_dir, branch)?;
        DataReader::read_file(&path, options.engine.unwrap_or(Engine::Netcdf4))
    }
}

//! Error types for xclim-testing.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for test data operations.
pub type Result<T> = std::result::Result<T, TestingError>;

/// Stage of the session bootstrap that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// Creating the session data directory.
    DataDir,
    /// Copying the default cache into the session directory.
    CopyCache,
    /// Generating the synthetic atmospheric dataset.
    GenerateAtmos,
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupStage::DataDir => f.write_str("create session data directory"),
            SetupStage::CopyCache => f.write_str("copy default cache"),
            SetupStage::GenerateAtmos => f.write_str("generate atmospheric dataset"),
        }
    }
}

/// Errors that can occur while provisioning or opening test data.
#[derive(Debug, Error)]
pub enum TestingError {
    /// Failed to open a file.
    #[error("Failed to open file: {path}")]
    FileOpen {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or write a NetCDF file.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// Requested file is not part of the branch's corpus.
    #[error("File '{file}' not found in testdata branch '{branch}'")]
    NotFound {
        /// Requested file identifier.
        file: PathBuf,
        /// Branch the lookup was made against.
        branch: String,
    },

    /// Session bootstrap aborted.
    #[error("Session setup failed during {stage}: {source}")]
    Setup {
        /// Stage that failed.
        stage: SetupStage,
        /// Underlying failure.
        #[source]
        source: Box<TestingError>,
    },

    /// A namespace entry is missing or has another kind.
    #[error("Namespace entry not found: {name}")]
    MissingEntry {
        /// Symbolic name that was looked up.
        name: String,
    },

    /// No platform cache directory could be determined.
    #[error("Could not determine a cache directory; set XCLIM_TESTDATA_CACHE_DIR")]
    NoCacheDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestingError {
    /// Create a FileOpen error.
    pub fn file_open(path: PathBuf, source: std::io::Error) -> Self {
        Self::FileOpen { path, source }
    }

    /// Create a NotFound error.
    pub fn not_found(file: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        Self::NotFound {
            file: file.into(),
            branch: branch.into(),
        }
    }

    /// Wrap an error as a bootstrap failure at the given stage.
    pub fn setup(stage: SetupStage, source: TestingError) -> Self {
        Self::Setup {
            stage,
            source: Box::new(source),
        }
    }

    /// Create a MissingEntry error.
    pub fn missing_entry(name: impl Into<String>) -> Self {
        Self::MissingEntry { name: name.into() }
    }
}

impl From<netcdf::Error> for TestingError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}

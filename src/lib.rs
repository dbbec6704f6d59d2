//! xclim-testing - session-scoped test data for climate documentation examples.
//!
//! Runnable documentation examples need real datasets. This crate provisions
//! them once per test session: it copies the default cache of reference files
//! into a temporary data directory, writes a synthetic atmospheric dataset next
//! to them, and publishes a namespace of helpers the examples call instead of
//! importing anything.
//!
//! # Features
//!
//! - Per-session data directory, shared by every fixture
//! - Cache-first dataset opener with pluggable fetch backends
//! - Deterministic synthetic atmospheric dataset (`atmosds.nc`)
//! - Capability probes that skip examples instead of failing them
//! - Optional plotting support (`plotting` feature)
//!
//! # Example
//!
//! ```no_run
//! use xclim_testing::{Session, TestDataConfig};
//!
//! # fn main() -> xclim_testing::Result<()> {
//! let session = Session::new(TestDataConfig::from_env()?)?;
//! let ns = session.bootstrap()?;
//!
//! let ds = ns.xr()?.open_dataset.open(ns.path("path_to_atmos_file")?)?;
//! println!("{} variables", ds.variable_names().len());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod atmos;
pub mod config;
pub mod data;
pub mod error;
pub mod namespace;
pub mod opener;
#[cfg(feature = "plotting")]
pub mod plot;
pub mod probe;
pub mod runner;
pub mod session;
pub mod util;

pub use config::TestDataConfig;
pub use error::{Result, TestingError};
pub use namespace::{DoctestNamespace, Entry, XrModule};
pub use opener::{CachingOpener, DatasetOpener, Engine, Fetch, MirrorFetch, NoFetch, OpenOptions};
pub use session::{ScopedOpener, Session};

//! Names available to documentation examples.
//!
//! Examples don't import anything; they look up helpers by name in a
//! [`DoctestNamespace`]. `open_dataset` is bound both flat and under `xr`
//! so example code can read `xr.open_dataset(...)`.

use crate::atmos::{self, TimeSeries, ATMOS_FILE};
use crate::error::{Result, TestingError};
use crate::probe::CapabilityProbe;
use crate::session::ScopedOpener;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Corpus files referenced by the examples, keyed by their namespace name.
pub const EXAMPLE_FILES: [(&str, &str); 5] = [
    ("path_to_pr_file", "NRCANdaily/nrcan_canada_daily_pr_1990.nc"),
    ("path_to_sfcWind_file", "ERA5/daily_surface_cancities_1990-1993.nc"),
    ("path_to_tas_file", "ERA5/daily_surface_cancities_1990-1993.nc"),
    ("path_to_tasmax_file", "NRCANdaily/nrcan_canada_daily_tasmax_1990.nc"),
    ("path_to_tasmin_file", "NRCANdaily/nrcan_canada_daily_tasmin_1990.nc"),
];

/// Suffix of the session-directory variants of [`EXAMPLE_FILES`].
pub const SESSION_SUFFIX: &str = "_in_session";

/// Attribute-style bundle exposed as `xr`.
#[derive(Debug, Clone)]
pub struct XrModule {
    /// Dataset opener, reachable as `xr.open_dataset`.
    pub open_dataset: ScopedOpener,
}

/// A value bound in the namespace.
#[derive(Debug, Clone)]
pub enum Entry {
    /// Dataset-opening callable.
    Opener(ScopedOpener),
    /// Library-style namespace.
    Module(XrModule),
    /// File path, relative to the corpus or absolute.
    Path(PathBuf),
    /// Capability probe.
    Probe(CapabilityProbe),
    /// In-memory daily series.
    Series(TimeSeries),
}

impl Entry {
    /// Short kind name, for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Opener(_) => "opener",
            Entry::Module(_) => "module",
            Entry::Path(_) => "path",
            Entry::Probe(_) => "probe",
            Entry::Series(_) => "series",
        }
    }
}

/// Mapping from symbolic name to helper.
#[derive(Debug, Clone, Default)]
pub struct DoctestNamespace {
    entries: BTreeMap<String, Entry>,
}

impl DoctestNamespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the previous entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(name.into(), entry)
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The flat `open_dataset` callable.
    pub fn open_dataset(&self) -> Result<&ScopedOpener> {
        match self.get("open_dataset") {
            Some(Entry::Opener(opener)) => Ok(opener),
            _ => Err(TestingError::missing_entry("open_dataset")),
        }
    }

    /// The `xr` bundle.
    pub fn xr(&self) -> Result<&XrModule> {
        match self.get("xr") {
            Some(Entry::Module(module)) => Ok(module),
            _ => Err(TestingError::missing_entry("xr")),
        }
    }

    /// A path entry.
    pub fn path(&self, name: &str) -> Result<&Path> {
        match self.get(name) {
            Some(Entry::Path(path)) => Ok(path),
            _ => Err(TestingError::missing_entry(name)),
        }
    }

    /// A probe entry.
    pub fn probe(&self, name: &str) -> Result<&CapabilityProbe> {
        match self.get(name) {
            Some(Entry::Probe(probe)) => Ok(probe),
            _ => Err(TestingError::missing_entry(name)),
        }
    }

    /// A series entry.
    pub fn series(&self, name: &str) -> Result<&TimeSeries> {
        match self.get(name) {
            Some(Entry::Series(series)) => Ok(series),
            _ => Err(TestingError::missing_entry(name)),
        }
    }
}

impl Extend<(String, Entry)> for DoctestNamespace {
    fn extend<I: IntoIterator<Item = (String, Entry)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// Session-independent entries: sample series and corpus-relative paths.
pub fn doctest_filepaths() -> Vec<(String, Entry)> {
    let tas = atmos::test_timeseries(atmos::seeded_year(0, 20.0, 253.15), "tas", "2000-07-01");
    let pr = atmos::test_timeseries(atmos::seeded_year(1, 5.0, 0.0), "pr", "2000-07-01");

    let mut entries = vec![
        ("tas".to_string(), Entry::Series(tas)),
        ("pr".to_string(), Entry::Series(pr)),
    ];
    entries.extend(
        EXAMPLE_FILES
            .iter()
            .map(|(name, file)| (name.to_string(), Entry::Path(PathBuf::from(file)))),
    );
    entries
}

/// Entries pointing into the session data directory.
///
/// Corpus files map to where the opener caches them for `branch`.
pub fn example_file_paths(data_dir: &Path, branch: &str) -> Vec<(String, Entry)> {
    let mut entries = vec![(
        "path_to_atmos_file".to_string(),
        Entry::Path(data_dir.join(ATMOS_FILE)),
    )];
    entries.extend(EXAMPLE_FILES.iter().map(|(name, file)| {
        (
            format!("{}{}", name, SESSION_SUFFIX),
            Entry::Path(data_dir.join(branch).join(file)),
        )
    }));
    entries
}

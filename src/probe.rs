//! Environment capability probes.
//!
//! Examples that need an optional capability call a probe first. A missing
//! capability turns into a [`Skip`], which the example runner reports
//! separately from failures.

use std::fmt;

/// Name under which the plotting probe is registered.
pub const PLOTTING_PROBE: &str = "is_plotting_enabled";

/// Signal that an example cannot run in this environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// Why the example was skipped.
    pub reason: String,
}

impl Skip {
    /// Create a skip signal.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped: {}", self.reason)
    }
}

impl std::error::Error for Skip {}

/// An optional capability of the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    name: &'static str,
    available: bool,
}

impl Capability {
    /// Describe a capability.
    pub const fn new(name: &'static str, available: bool) -> Self {
        Self { name, available }
    }

    /// Capability name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the capability is present.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Build a probe for this capability.
    pub fn probe(self) -> CapabilityProbe {
        CapabilityProbe { capability: self }
    }
}

/// The plotting capability, present when built with the `plotting` feature.
pub const fn plotting() -> Capability {
    Capability::new("plotting", cfg!(feature = "plotting"))
}

/// Zero-argument check an example calls before using a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityProbe {
    capability: Capability,
}

impl CapabilityProbe {
    /// Capability checked by this probe.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Succeed silently when the capability is present, skip otherwise.
    pub fn check(&self) -> Result<(), Skip> {
        if self.capability.is_available() {
            return Ok(());
        }
        tracing::debug!("Capability '{}' missing, skipping", self.capability.name);
        Err(Skip::new(format!(
            "This example requires {} support to be enabled.",
            self.capability.name
        )))
    }
}

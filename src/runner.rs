//! Running documentation examples against a namespace.

use crate::error::TestingError;
use crate::namespace::DoctestNamespace;
use crate::probe::Skip;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Why an example did not pass.
#[derive(Debug)]
pub enum ExampleError {
    /// The environment lacks a capability the example needs.
    Skip(Skip),
    /// The example is broken.
    Failed(anyhow::Error),
}

impl From<Skip> for ExampleError {
    fn from(skip: Skip) -> Self {
        Self::Skip(skip)
    }
}

impl From<TestingError> for ExampleError {
    fn from(err: TestingError) -> Self {
        Self::Failed(err.into())
    }
}

impl From<anyhow::Error> for ExampleError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err)
    }
}

type ExampleBody = Box<dyn Fn(&DoctestNamespace) -> Result<(), ExampleError> + Send + Sync>;

/// A runnable documentation example.
pub struct Example {
    name: String,
    body: ExampleBody,
}

impl fmt::Debug for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Example").field("name", &self.name).finish()
    }
}

impl Example {
    /// Create an example.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&DoctestNamespace) -> Result<(), ExampleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    /// Example name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Result of one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to completion.
    Passed,
    /// Skipped because of the environment.
    Skipped(String),
    /// Failed with the given message.
    Failed(String),
}

/// Outcomes of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// `(example name, outcome)` pairs.
    pub outcomes: Vec<(String, Outcome)>,
}

impl Report {
    /// True when no example failed.
    pub fn is_success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|(_, o)| matches!(o, Outcome::Failed(_)))
    }

    /// Outcome of the named example.
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|(n, _)| n == name).map(|(_, o)| o)
    }

    /// Number of examples with the given outcome kind.
    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, outcome) in &self.outcomes {
            match outcome {
                Outcome::Passed => writeln!(f, "{} ... ok", name)?,
                Outcome::Skipped(reason) => writeln!(f, "{} ... skipped ({})", name, reason)?,
                Outcome::Failed(msg) => writeln!(f, "{} ... FAILED: {}", name, msg)?,
            }
        }
        write!(
            f,
            "{} passed; {} skipped; {} failed",
            self.count(|o| *o == Outcome::Passed),
            self.count(|o| matches!(o, Outcome::Skipped(_))),
            self.count(|o| matches!(o, Outcome::Failed(_))),
        )
    }
}

/// Run `examples` one after another against `namespace`.
///
/// A panicking example is recorded as failed and the run continues.
pub fn run_examples(namespace: &DoctestNamespace, examples: &[Example]) -> Report {
    let mut report = Report::default();
    for example in examples {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| (example.body)(namespace))) {
            Ok(Ok(())) => Outcome::Passed,
            Ok(Err(ExampleError::Skip(skip))) => Outcome::Skipped(skip.reason),
            Ok(Err(ExampleError::Failed(err))) => Outcome::Failed(format!("{:#}", err)),
            Err(payload) => Outcome::Failed(format!("panicked: {}", panic_message(&*payload))),
        };
        tracing::debug!("Example {}: {:?}", example.name, outcome);
        report.outcomes.push((example.name.clone(), outcome));
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Entry;
    use crate::probe::Capability;

    #[test]
    fn test_outcomes_are_classified() {
        let mut ns = DoctestNamespace::new();
        ns.insert("probe", Entry::Probe(Capability::new("plotting", false).probe()));

        let examples = vec![
            Example::new("ok", |_| Ok(())),
            Example::new("needs_plot", |ns| {
                ns.probe("probe")?.check()?;
                Ok(())
            }),
            Example::new("missing", |ns| {
                ns.path("nope")?;
                Ok(())
            }),
        ];

        let report = run_examples(&ns, &examples);
        assert_eq!(report.outcome("ok"), Some(&Outcome::Passed));
        assert!(matches!(report.outcome("needs_plot"), Some(Outcome::Skipped(_))));
        assert!(matches!(report.outcome("missing"), Some(Outcome::Failed(m)) if m.contains("nope")));
        assert!(!report.is_success());
        assert!(report.to_string().ends_with("1 passed; 1 skipped; 1 failed"));
    }

    #[test]
    fn test_skips_alone_are_success() {
        let ns = DoctestNamespace::new();
        let examples = vec![Example::new("skip", |_| Err(Skip::new("no plotting").into()))];
        assert!(run_examples(&ns, &examples).is_success());
    }

    #[test]
    fn test_panicking_example_does_not_stop_run() {
        let ns = DoctestNamespace::new();
        let examples = vec![
            Example::new("boom", |_| {
                let values: Vec<i32> = Vec::new();
                let first = values[0];
                assert_eq!(first, 0);
                Ok(())
            }),
            Example::new("after", |_| Ok(())),
        ];

        let report = run_examples(&ns, &examples);
        assert!(matches!(report.outcome("boom"), Some(Outcome::Failed(m)) if m.starts_with("panicked")));
        assert_eq!(report.outcome("after"), Some(&Outcome::Passed));
        assert_eq!(report.count(|o| matches!(o, Outcome::Failed(_))), 1);
    }
}

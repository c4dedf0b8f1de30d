//! Batch retargeting with per-link error isolation.
//!
//! Each path is handled independently: its failure is recorded in the
//! [`BatchReport`] and processing moves on to the next path.

use crate::internal::link::read_target;
use crate::pattern::Substitution;
use crate::retarget::retarget;
use crate::Error;
use bon::bon;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, warn};

/// A substitution applied to many links
#[derive(Debug, Clone)]
pub struct Batch {
    substitution: Substitution,
    parallel: bool,
    dry_run: bool,
}

#[bon]
impl Batch {
    /// Compile the pattern once for the whole batch.
    ///
    /// `parallel` processes links on the rayon thread pool, `dry_run`
    /// computes new targets without touching any link.
    #[builder]
    pub fn new(
        pattern: &str,
        replacement: &str,
        #[builder(default)] parallel: bool,
        #[builder(default)] dry_run: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            substitution: Substitution::new(pattern, replacement)?,
            parallel,
            dry_run,
        })
    }
}

impl Batch {
    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    /// Retarget every path, in order. The report has one outcome per path.
    pub fn run<P>(&self, paths: &[P]) -> BatchReport
    where
        P: AsRef<Utf8Path> + Sync,
    {
        debug!(
            "Retargeting {} link(s) with {:?} (parallel: {}, dry run: {})",
            paths.len(),
            self.substitution.pattern(),
            self.parallel,
            self.dry_run
        );

        let outcomes: Vec<Outcome> = if self.parallel {
            paths
                .par_iter()
                .map(|path| self.process(path.as_ref()))
                .collect()
        } else {
            paths.iter().map(|path| self.process(path.as_ref())).collect()
        };

        BatchReport { outcomes }
    }

    fn process(&self, path: &Utf8Path) -> Outcome {
        let result = self.change(path);
        if let Err(e) = &result {
            warn!("Skipping {}: {}", path, e);
        }
        Outcome {
            path: path.to_owned(),
            result,
        }
    }

    fn change(&self, path: &Utf8Path) -> Result<Change, Error> {
        let previous = read_target(path)?;
        let target = self.substitution.apply(&previous)?;

        if !self.dry_run {
            retarget(path, &target)?;
        }

        Ok(Change { previous, target })
    }
}

/// Retarget every symlink in `paths` by replacing matches of `pattern` in its
/// target with `replacement`.
///
/// An invalid pattern or replacement fails every path rather than the call.
pub fn retarget_many<P>(pattern: &str, replacement: &str, paths: &[P]) -> BatchReport
where
    P: AsRef<Utf8Path> + Sync,
{
    match Batch::builder()
        .pattern(pattern)
        .replacement(replacement)
        .build()
    {
        Ok(batch) => batch.run(paths),
        Err(e) => {
            warn!("{}", e);
            let outcomes = paths
                .iter()
                .map(|path| {
                    let path = path.as_ref();
                    Outcome {
                        path: path.to_owned(),
                        result: read_target(path).and_then(|_| Err(e.duplicate())),
                    }
                })
                .collect();
            BatchReport { outcomes }
        }
    }
}

/// Target of one link before and after substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub previous: String,
    pub target: String,
}

impl Change {
    pub fn is_unchanged(&self) -> bool {
        self.previous == self.target
    }
}

/// Result for a single path of a batch
#[derive(Debug)]
pub struct Outcome {
    pub path: Utf8PathBuf,
    pub result: Result<Change, Error>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(change) if change.is_unchanged() => {
                write!(f, "{} -> {} (unchanged)", self.path, change.target)
            }
            Ok(change) => write!(
                f,
                "{} -> {} (was {})",
                self.path, change.target, change.previous
            ),
            Err(e) => write!(f, "{}: {}", self.path, e),
        }
    }
}

/// Per-path outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when no path failed
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_success)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl IntoIterator for BatchReport {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchReport {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}", outcome)?;
        }
        Ok(())
    }
}

//! Single-pass orchestration of a sorting run.
//!
//! The coordinator collects candidates once, then places and transfers them
//! one at a time. Per-file failures are reported and counted but never stop
//! the run; only a collection failure aborts it.

use crate::collector::{CollectionError, collect};
use crate::config::{Mode, RunConfig};
use crate::file_transfer::{TransferEngine, TransferError};
use crate::placer::{PlaceError, Placement, place};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// A non-fatal failure for one candidate.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Place(#[from] PlaceError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Counters for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub mode: Mode,
    pub dry_run: bool,
    /// Candidates that went through placement.
    pub processed: usize,
    /// Transferred, or simulated under dry run.
    pub succeeded: usize,
    /// Collisions left untouched.
    pub skipped: usize,
    pub failed: usize,
    /// Candidates dropped by filters before processing.
    pub excluded: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl RunSummary {
    fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            mode,
            dry_run,
            processed: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            excluded: 0,
            duration: Duration::ZERO,
        }
    }

    /// The four counters, for comparing runs irrespective of timing.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (self.processed, self.succeeded, self.skipped, self.failed)
    }
}

/// Receives run events as they happen.
///
/// Every method has an empty default so implementors pick what they need.
pub trait Reporter {
    /// Candidates have been collected (after filtering).
    fn candidates_found(&mut self, _count: usize) {}
    /// A candidate was dropped by the filters.
    fn excluded(&mut self, _path: &Path) {}
    /// Dry run would create `dir`. Reported once per directory.
    fn directory_simulated(&mut self, _dir: &Path) {}
    /// A transfer is about to be performed (or simulated).
    fn transferring(&mut self, _mode: Mode, _placement: &Placement) {}
    /// A candidate is already where it belongs.
    fn skipped(&mut self, _placement: &Placement) {}
    /// A candidate failed.
    fn failed(&mut self, _path: &Path, _error: &FileError) {}
    /// One candidate is done, whatever the result.
    fn advanced(&mut self) {}
}

/// A reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

enum FileStatus {
    Succeeded,
    Skipped,
    Failed,
}

/// Drives one run over a validated configuration.
pub struct RunCoordinator<'a> {
    config: &'a RunConfig,
    engine: TransferEngine,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            engine: TransferEngine::new(config.mode, config.dry_run),
        }
    }

    /// Uses `engine` instead of the default one built from the config.
    pub fn with_engine(mut self, engine: TransferEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Runs the full pass and returns the summary.
    ///
    /// # Errors
    ///
    /// Returns a [`CollectionError`] if the source tree cannot be enumerated.
    /// No file has been touched in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::config::{RunConfig, RunOptions};
    /// use sortdir::coordinator::{NullReporter, RunCoordinator};
    ///
    /// let config = RunConfig::new(RunOptions {
    ///     source: "/home/user/Downloads".into(),
    ///     dry_run: true,
    ///     ..Default::default()
    /// })?;
    /// let summary = RunCoordinator::new(&config).run(&mut NullReporter)?;
    /// println!("{} would be sorted", summary.succeeded);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<RunSummary, CollectionError> {
        let start = Instant::now();
        let mut summary = RunSummary::new(self.config.mode, self.config.dry_run);

        let collected = collect(&self.config.source_root, self.config.recursive)?;
        let candidates = self.select(collected, &mut summary, reporter);
        reporter.candidates_found(candidates.len());

        let mut simulated_dirs = HashSet::new();
        for candidate in &candidates {
            summary.processed += 1;
            match self.process(candidate, &mut simulated_dirs, reporter) {
                FileStatus::Succeeded => summary.succeeded += 1,
                FileStatus::Skipped => summary.skipped += 1,
                FileStatus::Failed => summary.failed += 1,
            }
            reporter.advanced();
        }

        summary.duration = start.elapsed();
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "run finished"
        );
        Ok(summary)
    }

    /// Drops candidates rejected by the filters.
    fn select(
        &self,
        candidates: Vec<PathBuf>,
        summary: &mut RunSummary,
        reporter: &mut dyn Reporter,
    ) -> Vec<PathBuf> {
        let filters = &self.config.filters;
        if filters.is_permissive() {
            return candidates;
        }

        candidates
            .into_iter()
            .filter(|candidate| {
                let relative = candidate
                    .strip_prefix(&self.config.source_root)
                    .unwrap_or(candidate);
                let keep = filters.should_include(relative);
                if !keep {
                    summary.excluded += 1;
                    reporter.excluded(candidate);
                }
                keep
            })
            .collect()
    }

    fn process(
        &self,
        candidate: &Path,
        simulated_dirs: &mut HashSet<PathBuf>,
        reporter: &mut dyn Reporter,
    ) -> FileStatus {
        let placement = match place(candidate, &self.config.source_root, &self.config.dest_root) {
            Ok(placement) => placement,
            Err(e) => {
                reporter.failed(candidate, &e.into());
                return FileStatus::Failed;
            }
        };

        if placement.is_collision {
            debug!(path = %candidate.display(), "already in place");
            reporter.skipped(&placement);
            return FileStatus::Skipped;
        }

        if self.engine.is_dry_run() {
            let dir = placement.destination_dir();
            if !dir.is_dir() && simulated_dirs.insert(dir.to_path_buf()) {
                reporter.directory_simulated(dir);
            }
        }

        reporter.transferring(self.engine.mode(), &placement);
        match self.engine.transfer(&placement) {
            Ok(outcome) => {
                debug!(path = %candidate.display(), ?outcome, "transferred");
                FileStatus::Succeeded
            }
            Err(e) => {
                reporter.failed(candidate, &e.into());
                FileStatus::Failed
            }
        }
    }
}

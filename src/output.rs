//! Operator-facing output.
//!
//! Action lines and the summary block go to stdout; failures go to stderr,
//! one line each, as they happen. A progress bar is drawn on stderr for
//! quiet real runs and stays hidden when stderr is not a terminal.

use crate::config::{Mode, RunConfig};
use crate::coordinator::{FileError, Reporter, RunSummary};
use crate::placer::Placement;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Consistent styling for CLI messages.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a fatal error to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "ERROR:".red().bold(), message);
    }

    /// Prints a per-file warning to stderr.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "WARN:".yellow(), message);
    }

    /// Formats a transfer line, e.g. `COPY: /in/a.jpg -> /out/images/a.jpg`.
    pub fn action_line(mode: Mode, source: &Path, destination: &Path) -> String {
        let label = format!("{}:", mode.as_str().to_uppercase());
        let label = match mode {
            Mode::Move => label.cyan(),
            Mode::Copy => label.green(),
        };
        format!("{} {} -> {}", label, source.display(), destination.display())
    }

    /// Formats the dry-run directory notice.
    pub fn dry_run_dir_line(dir: &Path) -> String {
        format!("{} ensure dir {}", "DRY-RUN:".yellow(), dir.display())
    }

    /// Creates a progress bar for `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let template = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Renders the fixed-format summary block.
    pub fn summary_block(summary: &RunSummary) -> String {
        let mut block = String::from("Done.\n");
        block.push_str(&format!("Processed: {}\n", summary.processed));
        block.push_str(&format!("Succeeded: {}\n", summary.succeeded));
        block.push_str(&format!("Skipped: {}\n", summary.skipped));
        block.push_str(&format!("Failed: {}\n", summary.failed));
        if summary.excluded > 0 {
            block.push_str(&format!("Excluded: {}\n", summary.excluded));
        }
        block.push_str(&format!(
            "Duration: {}",
            Self::format_duration(summary.duration)
        ));
        block
    }

    /// Rounds to the nearest millisecond.
    ///
    /// ```
    /// use sortdir::output::OutputFormatter;
    /// use std::time::Duration;
    ///
    /// assert_eq!(OutputFormatter::format_duration(Duration::from_micros(12_345_600)), "12.346s");
    /// assert_eq!(OutputFormatter::format_duration(Duration::from_micros(12_400)), "12ms");
    /// ```
    pub fn format_duration(duration: Duration) -> String {
        let rounded = duration.as_micros().saturating_add(500) / 1000;
        let millis = u64::try_from(rounded).unwrap_or(u64::MAX);
        format!("{:?}", Duration::from_millis(millis))
    }

    pub fn print_summary(summary: &RunSummary) {
        println!("{}", Self::summary_block(summary));
    }

    /// Prints the summary as a single JSON object.
    pub fn print_summary_json(summary: &RunSummary) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(summary)?);
        Ok(())
    }
}

/// Reporter that writes to the terminal.
pub struct ConsoleReporter {
    verbose: bool,
    print_actions: bool,
    show_progress: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// Action lines are printed when verbose or dry run, otherwise a
    /// progress bar tracks the run. `quiet` keeps stdout free for a
    /// machine-readable summary: only failures are written.
    pub fn new(config: &RunConfig, quiet: bool) -> Self {
        Self {
            verbose: !quiet && config.verbose,
            print_actions: !quiet && (config.verbose || config.dry_run),
            show_progress: !quiet && !config.verbose && !config.dry_run,
            progress: None,
        }
    }

    fn stdout_line(&self, line: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Clears the progress bar, if any.
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn candidates_found(&mut self, count: usize) {
        if self.verbose {
            println!("Files found: {count}");
        }
        if self.show_progress && count > 0 {
            self.progress = Some(OutputFormatter::create_progress_bar(count as u64));
        }
    }

    fn excluded(&mut self, path: &Path) {
        if self.verbose {
            self.stdout_line(format!("EXCLUDE: {}", path.display()));
        }
    }

    fn directory_simulated(&mut self, dir: &Path) {
        if self.verbose {
            self.stdout_line(OutputFormatter::dry_run_dir_line(dir));
        }
    }

    fn transferring(&mut self, mode: Mode, placement: &Placement) {
        if self.print_actions {
            self.stdout_line(OutputFormatter::action_line(
                mode,
                &placement.source,
                &placement.destination,
            ));
        }
    }

    fn skipped(&mut self, placement: &Placement) {
        if self.verbose {
            let source = placement.source.display();
            self.stdout_line(format!("SKIP: {source} (already in place)"));
        }
    }

    fn failed(&mut self, _path: &Path, error: &FileError) {
        let message = error.to_string();
        match &self.progress {
            Some(pb) => pb.suspend(|| OutputFormatter::warning(&message)),
            None => OutputFormatter::warning(&message),
        }
    }

    fn advanced(&mut self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }
}

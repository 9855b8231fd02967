//! sortdir - sort files into category subdirectories by extension.
//!
//! This library provides the pieces of a sorting run: classifying extensions,
//! collecting candidate files, resolving destinations, moving or copying files
//! (with a dry-run simulation), and coordinating a run into a summary.

pub mod cli;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod file_category;
pub mod file_transfer;
pub mod logging;
pub mod output;
pub mod placer;

pub use config::{ConfigError, Mode, RunConfig, RunOptions, Settings};
pub use coordinator::{NullReporter, Reporter, RunCoordinator, RunSummary};
pub use file_category::{Category, ExtensionMapper, classify};
pub use file_transfer::{Outcome, TransferEngine};
pub use placer::{Placement, place};

pub use cli::{Cli, run_cli};

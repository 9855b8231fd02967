/// File transfer for resolved placements.
///
/// This module performs (or simulates) the copy or move of one file into its
/// category directory. Moves try an atomic rename first and fall back to
/// copy-then-delete when the rename fails, which is what happens across
/// filesystem boundaries.
use crate::config::Mode;
use crate::placer::Placement;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Signature of the rename primitive used for the move fast path.
pub type RenameFn = fn(&Path, &Path) -> io::Result<()>;

/// Signature of the primitive that deletes the source after a fallback copy.
pub type RemoveFn = fn(&Path) -> io::Result<()>;

/// Step of the streaming copy that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    OpenSource,
    CreateDestination,
    Stream,
    Sync,
}

impl std::fmt::Display for CopyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            CopyStage::OpenSource => "open source",
            CopyStage::CreateDestination => "create destination",
            CopyStage::Stream => "copy contents",
            CopyStage::Sync => "sync destination",
        };
        f.write_str(stage)
    }
}

/// Errors that can occur while transferring a single file.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to create the category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A step of the byte copy failed. The destination may be partially written.
    #[error("{mode} failed: cannot {stage} ({} -> {}): {source}", .from.display(), .to.display())]
    CopyFailed {
        mode: Mode,
        stage: CopyStage,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The fallback copy succeeded but the source could not be deleted, so
    /// the file now exists in both places.
    #[error("move failed: copied to {} but could not remove {}: {source}", .to.display(), .from.display())]
    RemoveSourceFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// What a successful transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Moved with an atomic rename.
    Renamed,
    /// Moved by copying then deleting the source.
    CopiedThenRemoved,
    /// Copied, source left in place.
    Copied,
    /// Nothing touched; dry run.
    Simulated,
}

/// Performs placements in a fixed mode.
#[derive(Debug, Clone, Copy)]
pub struct TransferEngine {
    mode: Mode,
    dry_run: bool,
    rename: RenameFn,
    remove: RemoveFn,
}

impl TransferEngine {
    /// Creates an engine that renames with [`fs::rename`] and deletes with
    /// [`fs::remove_file`].
    pub fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            rename: atomic_rename,
            remove: remove_source,
        }
    }

    /// Replaces the rename primitive used for the move fast path.
    pub fn with_rename(mut self, rename: RenameFn) -> Self {
        self.rename = rename;
        self
    }

    /// Replaces the primitive that deletes the source after a fallback copy.
    pub fn with_remove(mut self, remove: RemoveFn) -> Self {
        self.remove = remove;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Transfers `placement.source` to `placement.destination`.
    ///
    /// Under dry run nothing is touched and [`Outcome::Simulated`] is
    /// returned. Otherwise the destination directory is created if needed
    /// and the file is copied or moved according to the engine's mode. An
    /// existing file at the destination is overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::config::Mode;
    /// use sortdir::file_transfer::TransferEngine;
    /// use sortdir::placer::place;
    /// use std::path::Path;
    ///
    /// let placement = place(Path::new("/in/a.png"), Path::new("/in"), Path::new("/out")).unwrap();
    /// let engine = TransferEngine::new(Mode::Copy, false);
    /// match engine.transfer(&placement) {
    ///     Ok(outcome) => println!("{:?}", outcome),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn transfer(&self, placement: &Placement) -> TransferResult<Outcome> {
        if self.dry_run {
            return Ok(Outcome::Simulated);
        }

        ensure_dir(placement.destination_dir())?;

        let (from, to) = (&placement.source, &placement.destination);
        match self.mode {
            Mode::Copy => {
                copy_file(from, to, Mode::Copy)?;
                Ok(Outcome::Copied)
            }
            Mode::Move => self.move_file(from, to),
        }
    }

    fn move_file(&self, from: &Path, to: &Path) -> TransferResult<Outcome> {
        match (self.rename)(from, to) {
            Ok(()) => return Ok(Outcome::Renamed),
            Err(e) => {
                debug!(from = %from.display(), to = %to.display(), error = %e, "rename failed, falling back to copy");
            }
        }

        copy_file(from, to, Mode::Move)?;
        (self.remove)(from).map_err(|source| TransferError::RemoveSourceFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
        Ok(Outcome::CopiedThenRemoved)
    }
}

fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

fn remove_source(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Creates `dir` and any missing parents. Existing directories are fine.
pub fn ensure_dir(dir: &Path) -> TransferResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!(dir = %dir.display(), "creating category directory");
    fs::create_dir_all(dir).map_err(|source| TransferError::DirectoryCreationFailed {
        path: dir.to_path_buf(),
        source,
    })
}

/// Streams `from` into a freshly truncated `to`, then syncs `to` to disk.
fn copy_file(from: &Path, to: &Path, mode: Mode) -> TransferResult<u64> {
    let failed = |stage: CopyStage, source: io::Error| TransferError::CopyFailed {
        mode,
        stage,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let mut input = File::open(from).map_err(|e| failed(CopyStage::OpenSource, e))?;
    let mut output = File::create(to).map_err(|e| failed(CopyStage::CreateDestination, e))?;
    let bytes = io::copy(&mut input, &mut output).map_err(|e| failed(CopyStage::Stream, e))?;
    output.sync_all().map_err(|e| failed(CopyStage::Sync, e))?;
    Ok(bytes)
}

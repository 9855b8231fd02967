//! Candidate discovery.
//!
//! Enumerates the regular files under a source root, either its direct
//! children only or the whole subtree. Enumeration happens once, up front,
//! and any read failure aborts the collection: a partial candidate set is
//! never returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Errors that abort candidate collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The root (or one of its entries) could not be listed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Recursive traversal hit an unreadable entry.
    #[error("Failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Collects candidate file paths under `root`.
///
/// Only regular files are returned; directories and symlinks are never
/// candidates. Paths are `root` joined with the entry names, so an absolute
/// `root` yields absolute candidates. Order follows the filesystem and is
/// not guaranteed stable.
///
/// # Errors
///
/// Returns a [`CollectionError`] if `root` or any directory beneath it (in
/// recursive mode) cannot be read.
///
/// # Examples
///
/// ```no_run
/// use sortdir::collector::collect;
/// use std::path::Path;
///
/// let files = collect(Path::new("/home/user/Downloads"), false)?;
/// println!("{} candidates", files.len());
/// # Ok::<(), sortdir::collector::CollectionError>(())
/// ```
pub fn collect(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, CollectionError> {
    let files = if recursive {
        collect_recursive(root)?
    } else {
        collect_direct(root)?
    };

    debug!(root = %root.display(), recursive, count = files.len(), "collected candidates");
    Ok(files)
}

fn collect_direct(root: &Path) -> Result<Vec<PathBuf>, CollectionError> {
    let read_err = |source: io::Error| CollectionError::ReadDir {
        path: root.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        if file_type.is_file() {
            files.push(entry.path());
        } else {
            trace!(path = %entry.path().display(), "skipping non-file entry");
        }
    }
    Ok(files)
}

fn collect_recursive(root: &Path) -> Result<Vec<PathBuf>, CollectionError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|source| CollectionError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

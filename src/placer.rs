//! Destination resolution for a single candidate.
//!
//! A candidate lands in `<dest_root>/<category>/<base name>`. Subdirectories
//! of the source root are flattened away. When the resolved destination is
//! the source itself the placement is flagged as a collision and must not be
//! transferred.

use crate::file_category::{Category, classify, extension_of};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors that prevent a candidate from being placed.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// The candidate does not live under the source root.
    #[error("cannot build relative path for {}: not under {}", .path.display(), .root.display())]
    NotUnderRoot { path: PathBuf, root: PathBuf },
    /// The relative path has no final file name component.
    #[error("cannot determine file name of {}", .path.display())]
    NoFileName { path: PathBuf },
}

/// A resolved (source, destination) pair for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Absolute path of the candidate.
    pub source: PathBuf,
    /// Absolute path the candidate is transferred to.
    pub destination: PathBuf,
    /// Category the candidate was classified into.
    pub category: Category,
    /// True when `destination` resolves to `source`.
    pub is_collision: bool,
}

impl Placement {
    /// Directory the destination file lives in.
    pub fn destination_dir(&self) -> &Path {
        self.destination.parent().unwrap_or(&self.destination)
    }
}

/// Computes the placement for `candidate`.
///
/// # Errors
///
/// Returns a [`PlaceError`] when `candidate` is not inside `source_root` or
/// has no file name.
///
/// # Examples
///
/// ```
/// use sortdir::placer::place;
/// use std::path::Path;
///
/// let placement = place(
///     Path::new("/data/in/trip/beach.JPG"),
///     Path::new("/data/in"),
///     Path::new("/data/out"),
/// )
/// .unwrap();
/// assert_eq!(placement.destination, Path::new("/data/out/images/beach.JPG"));
/// assert!(!placement.is_collision);
/// ```
pub fn place(
    candidate: &Path,
    source_root: &Path,
    dest_root: &Path,
) -> Result<Placement, PlaceError> {
    let source = normalize_path(candidate);
    let relative = source
        .strip_prefix(normalize_path(source_root))
        .map_err(|_| PlaceError::NotUnderRoot {
            path: candidate.to_path_buf(),
            root: source_root.to_path_buf(),
        })?;

    let file_name = relative.file_name().ok_or_else(|| PlaceError::NoFileName {
        path: candidate.to_path_buf(),
    })?;

    let category = classify(extension_of(&file_name.to_string_lossy()));
    let destination = normalize_path(&dest_root.join(category.dir_name()).join(file_name));
    let is_collision = destination == source;

    Ok(Placement {
        source,
        destination,
        category,
        is_collision,
    })
}

/// Lexically normalizes a path: drops `.` components and resolves `..`
/// against the preceding component. Symlinks are not resolved.
///
/// ```
/// use sortdir::placer::normalize_path;
/// use std::path::Path;
///
/// assert_eq!(normalize_path(Path::new("/a/./b/../c")), Path::new("/a/c"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                let at_root = matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                );
                if !popped && !at_root {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

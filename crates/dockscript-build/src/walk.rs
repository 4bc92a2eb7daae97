use std::path::{Component, Path, PathBuf};

use tracing::{trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::matcher::IgnoreMatcher;

/// A regular file found under the build root.
#[derive(Debug, Clone)]
pub struct FileEntry {
    relative_path: String,
    path: PathBuf,
}

impl FileEntry {
    /// Root-relative path with `/` separators.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>, WalkError> {
        std::fs::read(&self.path).map_err(|e| WalkError::ReadFile {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Lazily yields every non-ignored regular file under `root`.
///
/// Traversal is depth-first pre-order with siblings sorted by name, so the
/// sequence is stable across runs. Ignored directories are not descended
/// into. Symlinks are not followed and are skipped, as are other
/// non-regular files.
pub fn walk<'a>(
    root: &'a Path,
    matcher: &'a IgnoreMatcher,
) -> impl Iterator<Item = Result<FileEntry, WalkError>> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !is_ignored(root, matcher, entry))
        .filter_map(move |entry| match entry {
            Ok(entry) => to_file_entry(root, &entry).transpose(),
            Err(e) => Some(Err(WalkError::Walk {
                path: e
                    .path()
                    .map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                source: e,
            })),
        })
}

fn is_ignored(root: &Path, matcher: &IgnoreMatcher, entry: &DirEntry) -> bool {
    match relative_path(root, entry.path()) {
        Ok(rel) => {
            let ignored = matcher.matches(&rel, entry.file_type().is_dir());
            if ignored {
                trace!(path = %rel, "ignored");
            }
            ignored
        }
        // not ignored, so to_file_entry reports it
        Err(err) => {
            trace!(error = %err, "cannot match path");
            false
        }
    }
}

fn to_file_entry(root: &Path, entry: &DirEntry) -> Result<Option<FileEntry>, WalkError> {
    if !entry.file_type().is_file() {
        if entry.path_is_symlink() {
            warn!(path = %entry.path().display(), "not embedding symlink");
        } else if !entry.file_type().is_dir() {
            warn!(path = %entry.path().display(), "not embedding non-regular file");
        }
        return Ok(None);
    }

    Ok(Some(FileEntry {
        relative_path: relative_path(root, entry.path())?,
        path: entry.path().to_path_buf(),
    }))
}

/// Joins the components of `path` below `root` with `/`.
fn relative_path(root: &Path, path: &Path) -> Result<String, WalkError> {
    let unrepresentable = || WalkError::UnrepresentablePath(path.to_path_buf());
    let rel = path.strip_prefix(root).map_err(|_| unrepresentable())?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str().ok_or_else(unrepresentable)?),
            Component::CurDir => {}
            _ => return Err(unrepresentable()),
        }
    }
    Ok(parts.join("/"))
}

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("failed to traverse {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read file {path}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("path {0} cannot be expressed as UTF-8 relative to the build root")]
    UnrepresentablePath(PathBuf),
}

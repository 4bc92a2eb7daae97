use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Decides which project paths stay out of the generated script.
///
/// Patterns come from a single ignore file with gitignore semantics
/// (`*`, `**`, trailing `/`, `!` negation, later patterns override earlier
/// ones). On top of that, explicit exclusions are always ignored.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    root: PathBuf,
    rules: Gitignore,
    source: Option<PathBuf>,
    excluded: BTreeSet<String>,
}

impl IgnoreMatcher {
    /// A matcher that ignores nothing.
    pub fn empty() -> Self {
        Self {
            root: PathBuf::new(),
            rules: Gitignore::empty(),
            source: None,
            excluded: BTreeSet::new(),
        }
    }

    /// Compiles `pattern_file`, anchored at `root`.
    ///
    /// A missing or unreadable file yields [`IgnoreMatcher::empty`]. Lines
    /// with invalid globs are skipped with a warning.
    pub fn compile(root: &Path, pattern_file: &Path) -> Self {
        if !pattern_file.is_file() {
            debug!(path = %pattern_file.display(), "ignore file not found");
            return Self::empty();
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(pattern_file) {
            if err.is_io() {
                warn!(path = %pattern_file.display(), error = %err, "cannot read ignore file, ignoring nothing");
                return Self::empty();
            }
            warn!(path = %pattern_file.display(), error = %err, "skipping invalid ignore patterns");
        }

        match builder.build() {
            Ok(rules) => {
                debug!(
                    path = %pattern_file.display(),
                    patterns = rules.num_ignores() + rules.num_whitelists(),
                    "compiled ignore file"
                );
                Self {
                    root: root.to_path_buf(),
                    rules,
                    source: Some(pattern_file.to_path_buf()),
                    excluded: BTreeSet::new(),
                }
            }
            Err(err) => {
                warn!(path = %pattern_file.display(), error = %err, "cannot compile ignore file, ignoring nothing");
                Self::empty()
            }
        }
    }

    /// Compiles the first of `candidates` (relative to `root`) that exists.
    pub fn discover<S: AsRef<str>>(root: &Path, candidates: &[S]) -> Self {
        candidates
            .iter()
            .map(|name| root.join(name.as_ref()))
            .find(|path| path.is_file())
            .map_or_else(Self::empty, |path| Self::compile(root, &path))
    }

    /// Always ignore `relative_path` and, if it is a directory, everything below it.
    pub fn exclude(&mut self, relative_path: &str) {
        let normalized = normalize(relative_path);
        if !normalized.is_empty() {
            self.excluded.insert(normalized);
        }
    }

    /// The ignore file the patterns were compiled from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether `relative_path` (root-relative, `/`-separated) is ignored.
    pub fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        // Gitignore strips its root from candidates byte-wise, so a relative
        // root like `app` would eat the front of `application/...`.
        self.is_excluded(relative_path)
            || self
                .rules
                .matched_path_or_any_parents(self.root.join(relative_path), is_dir)
                .is_ignore()
    }

    fn is_excluded(&self, relative_path: &str) -> bool {
        self.excluded.iter().any(|ex| {
            relative_path == ex
                || relative_path
                    .strip_prefix(ex.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Drops `.` segments, empty segments, and trailing slashes.
fn normalize(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

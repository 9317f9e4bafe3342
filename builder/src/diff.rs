use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::config::DiffConfig;
use crate::error::BuildError;
use crate::vcs::VersionControl;

/// Revision the diffs are taken against: the commit before the last one.
const PREVIOUS_COMMIT: &str = "HEAD~1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Written { full: PathBuf, compact: PathBuf },
    /// The diff could not be retrieved.
    Unavailable,
    Empty,
    /// The commit introduced the file; there is nothing to compare with.
    NewFile,
    /// The source path has no segment to substitute.
    NoCodeSegment,
}

/// Writes the diff of the last commit back into the book, next to the
/// fragment that produced it.
pub struct DiffEmitter<'a> {
    book_dir: &'a Path,
    config: &'a DiffConfig,
}

impl<'a> DiffEmitter<'a> {
    pub fn new(book_dir: &'a Path, config: &'a DiffConfig) -> Self {
        DiffEmitter { book_dir, config }
    }

    pub fn emit(
        &self,
        vcs: &mut dyn VersionControl,
        repo_dir: &Path,
        source_path: &str,
    ) -> Result<DiffOutcome, BuildError> {
        let (Some(full_path), Some(compact_path)) = (
            artifact_path(source_path, &self.config.code_segment, &self.config.full_segment),
            artifact_path(source_path, &self.config.code_segment, &self.config.compact_segment),
        ) else {
            warn!(
                "{} has no '{}' path segment; not writing diffs",
                source_path, self.config.code_segment
            );
            return Ok(DiffOutcome::NoCodeSegment);
        };

        let compact = vcs.diff(repo_dir, PREVIOUS_COMMIT, None)?;
        let full = vcs.diff(repo_dir, PREVIOUS_COMMIT, Some(self.config.context_lines))?;
        if !compact.success || !full.success {
            debug!("no diff for {}: {}", source_path, compact.stderr.trim());
            return Ok(DiffOutcome::Unavailable);
        }
        if compact.stdout.trim().is_empty() {
            return Ok(DiffOutcome::Empty);
        }
        if compact.stdout.contains("/dev/null") {
            return Ok(DiffOutcome::NewFile);
        }

        let full_path = self.book_dir.join(full_path);
        let compact_path = self.book_dir.join(compact_path);
        write_creating_parents(&full_path, &full.stdout)?;
        write_creating_parents(&compact_path, &compact.stdout)?;

        Ok(DiffOutcome::Written {
            full: full_path,
            compact: compact_path,
        })
    }
}

/// `source_path` with every `code` segment replaced by `replacement`, or
/// `None` when there is no such segment.
pub fn artifact_path(source_path: &str, code: &str, replacement: &str) -> Option<PathBuf> {
    let mut replaced = false;
    let path: PathBuf = Path::new(source_path)
        .components()
        .map(|component| match component {
            Component::Normal(segment) if segment == code => {
                replaced = true;
                Component::Normal(OsStr::new(replacement))
            }
            other => other,
        })
        .collect();
    replaced.then_some(path)
}

pub(crate) fn write_creating_parents(path: &Path, contents: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(BuildError::write(parent))?;
    }
    std::fs::write(path, contents).map_err(BuildError::write(path))
}

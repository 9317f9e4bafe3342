use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BuildError;

/// File looked up in the book directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "bookrepo.toml";

/// Settings that shape how a book is read and replayed. Every field has a
/// default, so an empty or missing file is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Glob, relative to the book directory, selecting documentation files.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Attribute prefix marking directives meant for the builder.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Tags starting with this prefix prefix their commit messages with a
    /// chapter label: `chapter-3` gives `Chapter 3 - <message>`.
    #[serde(default = "default_chapter_prefix")]
    pub chapter_prefix: String,

    #[serde(default = "default_chapter_label")]
    pub chapter_label: String,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub diff: DiffConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_git_program")]
    pub program: String,

    /// Author and committer of the replayed history. Falls back to the
    /// user's git configuration when unset.
    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffConfig {
    /// Path segment of fragment sources that diff artifacts replace.
    #[serde(default = "default_code_segment")]
    pub code_segment: String,

    #[serde(default = "default_full_segment")]
    pub full_segment: String,

    #[serde(default = "default_compact_segment")]
    pub compact_segment: String,

    /// Context lines of the full rendering.
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
}

fn default_pattern() -> String {
    "*.adoc".to_string()
}

fn default_marker() -> String {
    adoc::directive::DEFAULT_MARKER.to_string()
}

fn default_chapter_prefix() -> String {
    "chapter-".to_string()
}

fn default_chapter_label() -> String {
    "Chapter ".to_string()
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_code_segment() -> String {
    "Code".to_string()
}

fn default_full_segment() -> String {
    "Full".to_string()
}

fn default_compact_segment() -> String {
    "Compact".to_string()
}

fn default_context_lines() -> u32 {
    1000
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            pattern: default_pattern(),
            marker: default_marker(),
            chapter_prefix: default_chapter_prefix(),
            chapter_label: default_chapter_label(),
            git: GitConfig::default(),
            diff: DiffConfig::default(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            program: default_git_program(),
            author_name: None,
            author_email: None,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            code_segment: default_code_segment(),
            full_segment: default_full_segment(),
            compact_segment: default_compact_segment(),
            context_lines: default_context_lines(),
        }
    }
}

impl BuildConfig {
    pub fn from_toml(source: &str, path: &Path) -> Result<Self, BuildError> {
        toml::from_str(source).map_err(|source| BuildError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let source = std::fs::read_to_string(path).map_err(BuildError::read(path))?;
        Self::from_toml(&source, path)
    }

    /// Load `bookrepo.toml` from the book directory, or the defaults.
    pub fn discover(book_dir: &Path) -> Result<Self, BuildError> {
        let path = book_dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Per-run switches, taken from the command line.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub book_dir: PathBuf,
    pub repos_dir: PathBuf,
    /// Only replay directives for this repository.
    pub repo_filter: Option<String>,
    /// Recreate an existing first repository without asking.
    pub drop: bool,
    pub generate_diffs: bool,
}

impl BuildOptions {
    pub fn new(book_dir: impl Into<PathBuf>, repos_dir: impl Into<PathBuf>) -> Self {
        BuildOptions {
            book_dir: book_dir.into(),
            repos_dir: repos_dir.into(),
            repo_filter: None,
            drop: false,
            generate_diffs: false,
        }
    }
}

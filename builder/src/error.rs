use std::path::PathBuf;

use adoc::ParseError;

/// Errors that abort a build. Failed git commands are not among them:
/// they are logged and counted in the report instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{} error(s) in the book sources", .0.len())]
    Parse(Vec<ParseError>),

    #[error("no such directory: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<ParseError> for BuildError {
    fn from(error: ParseError) -> Self {
        BuildError::Parse(vec![error])
    }
}

impl BuildError {
    pub fn read(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BuildError::Read { path, source }
    }

    pub fn write(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BuildError::Write { path, source }
    }
}

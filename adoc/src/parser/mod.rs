pub mod error;
mod scanner;

pub use error::{ParseError, ParseErrorKind};
pub use scanner::Directives;

use crate::directive::{DEFAULT_MARKER, Directive};

/// Parser entry point for one documentation file.
pub struct Parser {
    source: String,
    file_id: usize,
    marker: String,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// Use a different attribute marker than `bdd-`.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Iterate the file's directives in text order. Every call starts a
    /// fresh pass over the source.
    pub fn directives(&self) -> Directives<'_> {
        Directives::new(&self.source, &self.marker, self.file_id)
    }

    /// Collect every directive, or every malformed one if any.
    pub fn parse(&self) -> Result<Vec<Directive>, Vec<ParseError>> {
        let mut directives = Vec::new();
        let mut errors = Vec::new();
        for result in self.directives() {
            match result {
                Ok(directive) => directives.push(directive),
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(directives)
        } else {
            Err(errors)
        }
    }
}

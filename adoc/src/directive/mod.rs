use std::ops::Range;

use crate::attribute::Attributes;

/// Marker that identifies directives meant for the repository builder.
pub const DEFAULT_MARKER: &str = "bdd-";

/// One `include::path[attributes]` occurrence carrying builder metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Path of the included fragment, relative to the documentation root.
    pub source_path: String,
    pub attributes: Attributes,
    /// Byte span of the whole directive in its documentation file.
    pub span: Range<usize>,
    /// The documentation file ID (for error reporting with codespan-reporting).
    pub file_id: usize,
}

impl Directive {
    /// Look up an attribute by its unprefixed name, e.g. `repo` for `bdd-repo`.
    pub fn marked<'a>(&'a self, marker: &str, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.strip_prefix(marker) == Some(name))
            .map(|(_, v)| v)
    }
}

use std::sync::LazyLock;

use regex::{CaptureMatches, Regex};

use crate::attribute;
use crate::directive::Directive;
use crate::parser::error::ParseError;

/// `include::<path>[<attribute-list>]`, one per line. The attribute list
/// runs to the last `]` on the line so that values may contain brackets.
static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"include::([^\[\r\n]*)\[([^\r\n]*)\]").unwrap());

/// Lazy scan over one documentation file. Includes whose attribute list
/// does not mention the marker are skipped.
pub struct Directives<'s> {
    matches: CaptureMatches<'static, 's>,
    marker: &'s str,
    file_id: usize,
}

impl<'s> Directives<'s> {
    pub(crate) fn new(source: &'s str, marker: &'s str, file_id: usize) -> Self {
        Directives {
            matches: INCLUDE_PATTERN.captures_iter(source),
            marker,
            file_id,
        }
    }
}

impl Iterator for Directives<'_> {
    type Item = Result<Directive, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        for caps in self.matches.by_ref() {
            let (Some(whole), Some(path), Some(list)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            if !list.as_str().contains(self.marker) {
                continue;
            }

            let directive = attribute::parse(list.as_str(), list.start(), self.file_id).map(
                |attributes| Directive {
                    source_path: path.as_str().trim().to_string(),
                    attributes,
                    span: whole.range(),
                    file_id: self.file_id,
                },
            );
            return Some(directive);
        }
        None
    }
}

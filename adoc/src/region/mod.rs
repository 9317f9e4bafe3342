use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::error::{ParseError, ParseErrorKind};

/// A single-line comment whose text begins with `tag::<name>::` or
/// `end::<name>::`.
static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?://+|#+|--+|;+|%+|/\*+|<!--|\(\*|')\s*(tag|end)::([^\s:]+)::").unwrap()
});

/// Result of filtering a source file by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// No regions were requested: the file is used as is.
    Verbatim,
    Filtered {
        content: String,
        /// A region still open when the file ended. Tolerated, but worth
        /// reporting since its end marker is probably misspelled.
        unclosed: Option<String>,
    },
}

impl Extraction {
    /// The text to write, given the unfiltered source.
    pub fn into_content(self, source: &str) -> String {
        match self {
            Extraction::Verbatim => source.to_string(),
            Extraction::Filtered { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker<'a> {
    Start(&'a str),
    End(&'a str),
}

fn classify(line: &str) -> Option<Marker<'_>> {
    let caps = MARKER_PATTERN.captures(line)?;
    let name = caps.get(2)?.as_str();
    match caps.get(1)?.as_str() {
        "tag" => Some(Marker::Start(name)),
        _ => Some(Marker::End(name)),
    }
}

/// Split an `include-tags` value such as `setup; teardown` into names.
pub fn parse_region_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep the lines outside any region plus the lines of the requested
/// regions. Marker lines themselves are never kept.
///
/// Fails when a region starts while another one is still open; nested
/// regions are not supported.
pub fn extract(
    source: &str,
    file_id: usize,
    requested: &[String],
) -> Result<Extraction, ParseError> {
    Ok(extract_with_warnings(source, file_id, requested)?.0)
}

/// Like [`extract`], but also returns a warning for a region left open
/// at end of file, pointing at its start marker.
pub fn extract_with_warnings(
    source: &str,
    file_id: usize,
    requested: &[String],
) -> Result<(Extraction, Option<ParseError>), ParseError> {
    if requested.is_empty() {
        return Ok((Extraction::Verbatim, None));
    }

    let mut content = String::with_capacity(source.len());
    let mut current: Option<(&str, Range<usize>)> = None;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let span = offset..offset + line.trim_end().len();
        offset += line.len();

        match classify(line) {
            Some(Marker::Start(name)) => {
                if let Some((open, _)) = current {
                    return Err(ParseError::error(
                        ParseErrorKind::UnclosedRegion(open.to_string()),
                        span,
                        file_id,
                    )
                    .with_note(format!(
                        "add `end::{open}::` before starting region '{name}'"
                    )));
                }
                current = Some((name, span));
            }
            Some(Marker::End(name)) => {
                if current.as_ref().is_some_and(|(open, _)| *open == name) {
                    current = None;
                }
            }
            None => {
                let visible = match &current {
                    None => true,
                    Some((open, _)) => requested.iter().any(|r| r == open),
                };
                if visible {
                    content.push_str(line);
                }
            }
        }
    }

    let warning = current.as_ref().map(|(name, span)| {
        ParseError::warning(
            ParseErrorKind::UnterminatedRegion(name.to_string()),
            span.clone(),
            file_id,
        )
    });
    let extraction = Extraction::Filtered {
        content,
        unclosed: current.map(|(name, _)| name.to_string()),
    };
    Ok((extraction, warning))
}

use std::ops::Range;

use crate::parser::error::{ParseError, ParseErrorKind};

/// Attributes of one directive, in the order they were written.
///
/// Keys are kept verbatim (marker prefix included). Writing a key twice
/// keeps the position of the first occurrence and the value of the last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse an attribute list (the text between the directive's brackets).
///
/// `offset` is the byte position of `list` inside its file, so that a
/// malformed segment can be reported at its real location.
pub fn parse(list: &str, offset: usize, file_id: usize) -> Result<Attributes, ParseError> {
    let mut attributes = Attributes::new();

    for segment in split_unquoted_commas(list) {
        let raw = &list[segment.clone()];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            let lead = raw.len() - raw.trim_start().len();
            let start = offset + segment.start + lead;
            return Err(ParseError::error(
                ParseErrorKind::MalformedAttribute {
                    segment: trimmed.to_string(),
                },
                start..start + trimmed.len(),
                file_id,
            )
            .with_note("attributes are written as key=\"value\", separated by commas"));
        };

        attributes.insert(key.trim(), strip_quotes(value.trim()));
    }

    Ok(attributes)
}

/// Split `list` on commas that are not inside a double-quoted value.
/// A comma is protected while an odd number of quotes has been seen.
fn split_unquoted_commas(list: &str) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (pos, ch) in list.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                segments.push(start..pos);
                start = pos + 1;
            }
            _ => {}
        }
    }
    segments.push(start..list.len());
    segments
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

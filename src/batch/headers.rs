//! Case-insensitive, ordered, multi-valued header table.
//!
//! # Design Decisions
//! - Lookup is case-insensitive; the first-seen spelling of a name is kept
//! - Comma-separated values are stored individually and deduplicated
//! - Absent headers are `None`/empty, never an error

use std::collections::HashMap;

/// Header names with special meaning inside a batch.
pub mod names {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_ID: &str = "Content-Id";
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
    /// Content-Id of the HTTP message itself, as seen by the dispatch layer.
    pub const REQUEST_CONTENT_ID: &str = "RequestContentId";
    /// Content-Id of the enclosing MIME part, as seen by the dispatch layer.
    pub const MIME_HEADER_CONTENT_ID: &str = "MimeHeaderContentId";
}

/// One logical header with all of its values.
///
/// Equality compares the name case-insensitively and the values exactly.
/// The source line is ignored.
#[derive(Debug, Clone)]
pub struct HeaderField {
    name: String,
    values: Vec<String>,
    line: usize,
}

impl HeaderField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Line on which the header was first seen (0 if synthesized).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn value(&self) -> String {
        self.values.join(", ")
    }
}

impl PartialEq for HeaderField {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.values == other.values
    }
}

impl Eq for HeaderField {}

/// Ordered header table keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Append the values of `value` to `name`, skipping exact duplicates.
    pub fn add(&mut self, name: &str, value: &str, line: usize) {
        let idx = match self.position(name) {
            Some(idx) => idx,
            None => {
                self.fields.push(HeaderField {
                    name: name.to_string(),
                    values: Vec::new(),
                    line,
                });
                self.fields.len() - 1
            }
        };

        let field = &mut self.fields[idx];
        for part in split_values(value) {
            if !field.values.iter().any(|v| v == &part) {
                field.values.push(part);
            }
        }
    }

    /// Replace every value of `name` with `value`.
    pub fn replace(&mut self, name: &str, value: &str, line: usize) {
        self.remove(name);
        self.add(name, value, line);
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderField> {
        self.position(name).map(|idx| self.fields.remove(idx))
    }

    /// All values of `name` joined with `", "`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.field(name).map(HeaderField::value)
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.field(name).map(HeaderField::values).unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&HeaderField> {
        self.position(name).map(|idx| &self.fields[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn line_number(&self, name: &str) -> Option<usize> {
        self.field(name).map(HeaderField::line)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Export as original-case name -> joined value.
    pub fn to_single_map(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value()))
            .collect()
    }

    /// Export as original-case name -> ordered values.
    pub fn to_multi_map(&self) -> HashMap<String, Vec<String>> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.values.clone()))
            .collect()
    }
}

/// Split a header value on commas that are not inside a quoted string.
pub(crate) fn split_values(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            escaped = false;
        } else if quoted && c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == ',' && !quoted {
            push_trimmed(&mut parts, &current);
            current.clear();
            continue;
        }
        current.push(c);
    }
    push_trimmed(&mut parts, &current);
    parts
}

fn push_trimmed(parts: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        parts.push(value.to_string());
    }
}

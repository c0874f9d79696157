//! Boundary-based splitting of a line sequence into parts.
//!
//! # Design Decisions
//! - The preamble before the first delimiter is dropped
//! - Everything after the close delimiter is ignored, not rejected
//! - The line break before a delimiter belongs to the delimiter and is
//!   removed from the last line of the part it closes

use regex::Regex;

use crate::batch::types::{first_line_number, BatchError, BatchResult, ErrorCode, Line};

/// Compiled delimiter patterns for one boundary.
#[derive(Debug, Clone)]
pub struct BoundarySplitter {
    boundary: String,
    open: Regex,
    close: Regex,
}

impl BoundarySplitter {
    pub fn new(boundary: &str) -> BatchResult<Self> {
        let escaped = regex::escape(boundary);
        let open = Regex::new(&format!(r"^--{}\s*$", escaped));
        let close = Regex::new(&format!(r"^--{}--\s*$", escaped));

        match (open, close) {
            (Ok(open), Ok(close)) => Ok(Self {
                boundary: boundary.to_string(),
                open,
                close,
            }),
            _ => Err(BatchError::syntax(ErrorCode::InvalidBoundary, 1).with_param(boundary)),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn is_open_delimiter(&self, line: &Line) -> bool {
        self.open.is_match(line.text())
    }

    pub fn is_close_delimiter(&self, line: &Line) -> bool {
        self.close.is_match(line.text())
    }

    /// Partition `lines` into the parts between delimiters.
    pub fn split(&self, lines: Vec<Line>) -> BatchResult<Vec<Vec<Line>>> {
        let first_line = first_line_number(&lines, 1);
        let mut parts: Vec<Vec<Line>> = Vec::new();
        let mut current: Option<Vec<Line>> = None;
        let mut closed = false;

        for line in lines {
            if self.is_close_delimiter(&line) {
                if let Some(part) = current.take() {
                    parts.push(close_part(part));
                }
                closed = true;
                break;
            } else if self.is_open_delimiter(&line) {
                if let Some(part) = current.replace(Vec::new()) {
                    parts.push(close_part(part));
                }
            } else if let Some(part) = current.as_mut() {
                part.push(line);
            }
            // Lines before the first delimiter are preamble
        }

        if !closed {
            let code = if current.is_some() || !parts.is_empty() {
                ErrorCode::MissingCloseDelimiter
            } else {
                ErrorCode::MissingBoundaryDelimiter
            };
            return Err(BatchError::syntax(code, first_line).with_param(&self.boundary));
        }
        if parts.is_empty() {
            return Err(
                BatchError::syntax(ErrorCode::NoMatchWithBoundaryString, first_line)
                    .with_param(&self.boundary),
            );
        }

        tracing::trace!(boundary = %self.boundary, parts = parts.len(), "Split multipart body");
        Ok(parts)
    }
}

/// Strip the line break that belongs to the following delimiter.
fn close_part(mut part: Vec<Line>) -> Vec<Line> {
    if let Some(last) = part.pop() {
        part.push(last.strip_line_break());
    }
    part
}

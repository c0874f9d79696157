//! Header-block, blank-line and content-type grammar shared by all parts.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::batch::accept::AcceptParser;
use crate::batch::headers::{names, Headers};
use crate::batch::types::{BatchError, BatchResult, ErrorCode, Line};

pub const MULTIPART_MIXED: &str = "multipart/mixed";
pub const APPLICATION_HTTP: &str = "application/http";

/// RFC 7230 `field-name ":" OWS field-value OWS`.
static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([!#$%&'*+\-.^_`|~0-9A-Za-z]+):[ \t]*(.*?)[ \t]*$").expect("valid regex")
});

/// RFC 2046 boundary: 1 to 70 bchars, not ending in a space.
static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Za-z'()+_,\-./:=? ]{0,69}[0-9A-Za-z'()+_,\-./:=?]$").expect("valid regex")
});

/// Split a header line into name and value.
pub fn header_line(line: &str) -> Option<(&str, &str)> {
    let captures = HEADER_LINE.captures(line.trim_end())?;
    let name = captures.get(1)?.as_str();
    let value = captures.get(2)?.as_str();
    Some((name, value))
}

/// Value of a `Content-Type` header line, if `line` is one.
pub fn content_type_value(line: &str) -> Option<&str> {
    header_line(line)
        .filter(|(name, _)| name.eq_ignore_ascii_case(names::CONTENT_TYPE))
        .map(|(_, value)| value)
}

/// Lower-cased `type/subtype` without parameters.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Look up a content-type parameter, removing surrounding quotes.
pub fn parameter(content_type: &str, name: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(name) {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some(value.to_string())
    })
}

pub fn is_multipart_mixed(content_type: &str) -> bool {
    media_type(content_type) == MULTIPART_MIXED
}

pub fn is_application_http(content_type: &str) -> bool {
    media_type(content_type) == APPLICATION_HTTP
}

/// Extract and validate the boundary of a `multipart/mixed` content type.
pub fn boundary(content_type: &str, line: usize) -> BatchResult<String> {
    if !is_multipart_mixed(content_type) {
        return Err(
            BatchError::syntax(ErrorCode::InvalidContentType, line).with_param(content_type),
        );
    }

    let boundary = parameter(content_type, "boundary").ok_or_else(|| {
        BatchError::syntax(ErrorCode::MissingBoundary, line).with_param(content_type)
    })?;

    if !BOUNDARY.is_match(&boundary) {
        return Err(BatchError::syntax(ErrorCode::InvalidBoundary, line).with_param(boundary));
    }
    Ok(boundary)
}

/// Consume the header block at the front of `lines`.
///
/// Stops at the first line that is not a header. `Accept` and
/// `Accept-Language` lines are merged and written once, quality-sorted.
pub fn consume_headers(lines: &mut VecDeque<Line>) -> BatchResult<Headers> {
    let mut headers = Headers::new();
    let mut accept = AcceptParser::new();

    while let Some(line) = lines.front() {
        let Some((name, value)) = header_line(line.text()) else {
            break;
        };

        if name.eq_ignore_ascii_case(names::ACCEPT) {
            accept.add_accept_header(value, line.number());
        } else if name.eq_ignore_ascii_case(names::ACCEPT_LANGUAGE) {
            accept.add_accept_language_header(value, line.number());
        } else {
            headers.add(name, value, line.number());
        }
        lines.pop_front();
    }

    if let Some(line) = accept.accept_line() {
        let values = accept.parse_accept_headers()?;
        headers.add(names::ACCEPT, &values.join(", "), line);
    }
    if let Some(line) = accept.accept_language_line() {
        let values = accept.parse_accept_language_headers()?;
        headers.add(names::ACCEPT_LANGUAGE, &values.join(", "), line);
    }

    Ok(headers)
}

/// Consume the blank line that terminates a header block.
///
/// A part with nothing left after its headers needs no separator.
pub fn consume_blank_line(lines: &mut VecDeque<Line>, strict: bool) -> BatchResult<()> {
    let Some(line) = lines.front() else {
        return Ok(());
    };

    if line.is_blank() {
        lines.pop_front();
        Ok(())
    } else if strict {
        Err(BatchError::syntax(ErrorCode::MissingBlankLine, line.number()))
    } else {
        tracing::warn!(line = line.number(), "Missing blank line after header block tolerated");
        Ok(())
    }
}

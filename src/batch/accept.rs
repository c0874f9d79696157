//! Accumulation of `Accept` and `Accept-Language` header lines.
//!
//! Several physical header lines are merged into one logical list, sorted by
//! quality (descending). Entries of equal quality keep their first-seen order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::batch::headers::split_values;
use crate::batch::types::{BatchError, BatchResult, ErrorCode};

static QUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:0(?:\.[0-9]{0,3})?|1(?:\.0{0,3})?)$").expect("valid regex"));

static LANGUAGE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z]{1,8}(?:-[A-Za-z0-9]{1,8})*|\*)$").expect("valid regex")
});

#[derive(Debug, Clone)]
struct RawValue {
    value: String,
    line: usize,
}

#[derive(Debug, Clone)]
struct Weighted {
    value: String,
    /// Quality in thousandths, so sorting never touches floats.
    quality: u16,
}

/// Collects accept-style header lines until the header block is complete.
#[derive(Debug, Default, Clone)]
pub struct AcceptParser {
    accept: Vec<RawValue>,
    accept_language: Vec<RawValue>,
}

impl AcceptParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_accept_header(&mut self, value: &str, line: usize) {
        self.accept.push(RawValue {
            value: value.to_string(),
            line,
        });
    }

    pub fn add_accept_language_header(&mut self, value: &str, line: usize) {
        self.accept_language.push(RawValue {
            value: value.to_string(),
            line,
        });
    }

    /// Line of the first `Accept` header seen, if any.
    pub fn accept_line(&self) -> Option<usize> {
        self.accept.first().map(|v| v.line)
    }

    pub fn accept_language_line(&self) -> Option<usize> {
        self.accept_language.first().map(|v| v.line)
    }

    /// Media ranges, without their `q` parameter, best quality first.
    pub fn parse_accept_headers(&self) -> BatchResult<Vec<String>> {
        let weighted = collect(&self.accept, ErrorCode::InvalidAcceptHeader, |_| true)?;
        Ok(sort_by_quality(weighted))
    }

    /// Language ranges, best quality first.
    pub fn parse_accept_language_headers(&self) -> BatchResult<Vec<String>> {
        let weighted = collect(
            &self.accept_language,
            ErrorCode::InvalidAcceptLanguageHeader,
            |range| LANGUAGE_RANGE.is_match(range),
        )?;
        Ok(sort_by_quality(weighted))
    }
}

fn collect(
    raw: &[RawValue],
    code: ErrorCode,
    valid_range: impl Fn(&str) -> bool,
) -> BatchResult<Vec<Weighted>> {
    let mut entries = Vec::new();
    for header in raw {
        for entry in split_values(&header.value) {
            let weighted = parse_entry(&entry)
                .filter(|w| valid_range(w.value.split(';').next().unwrap_or_default()))
                .ok_or_else(|| BatchError::syntax(code, header.line).with_param(&entry))?;
            entries.push(weighted);
        }
    }
    Ok(entries)
}

fn parse_entry(entry: &str) -> Option<Weighted> {
    let mut params = entry.split(';').map(str::trim);
    let range = params.next().filter(|r| !r.is_empty())?;

    let mut value = range.to_string();
    let mut quality = 1000;
    for param in params {
        match param.split_once('=') {
            Some((name, q)) if name.trim().eq_ignore_ascii_case("q") => {
                quality = parse_quality(q.trim())?;
            }
            _ => {
                value.push(';');
                value.push_str(param);
            }
        }
    }
    Some(Weighted { value, quality })
}

fn parse_quality(q: &str) -> Option<u16> {
    if !QUALITY.is_match(q) {
        return None;
    }
    let (whole, fraction) = q.split_once('.').unwrap_or((q, ""));
    let mut thousandths: u16 = whole.parse::<u16>().ok()? * 1000;
    for (digit, scale) in fraction.chars().zip([100u16, 10, 1]) {
        thousandths += digit.to_digit(10)? as u16 * scale;
    }
    Some(thousandths)
}

fn sort_by_quality(mut entries: Vec<Weighted>) -> Vec<String> {
    // sort_by is stable: ties keep first-seen order
    entries.sort_by(|a, b| b.quality.cmp(&a.quality));
    entries.into_iter().map(|w| w.value).collect()
}

//! Line and error definitions shared by every stage of the batch engine.

use std::fmt;
use thiserror::Error;

/// A single decoded line of the batch body.
///
/// `text` keeps its line terminator so the original bytes can be rebuilt;
/// `raw` holds those original bytes untouched by charset decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    raw: Vec<u8>,
    number: usize,
}

impl Line {
    /// Create a line from already decoded text and its source bytes.
    pub fn new(text: impl Into<String>, raw: impl Into<Vec<u8>>, number: usize) -> Self {
        Self {
            text: text.into(),
            raw: raw.into(),
            number,
        }
    }

    /// Create a line whose bytes are the UTF-8 encoding of `text`.
    pub fn from_text(text: impl Into<String>, number: usize) -> Self {
        let text = text.into();
        let raw = text.as_bytes().to_vec();
        Self { text, raw, number }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// 1-based position of this line in the batch body.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Text with trailing whitespace and the line terminator removed.
    pub fn content(&self) -> &str {
        self.text.trim_end()
    }

    /// True if the line holds nothing but whitespace and/or a terminator.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Remove exactly one trailing line break (`\r\n`, `\n` or `\r`).
    pub fn strip_line_break(&self) -> Line {
        let cut = if self.text.ends_with("\r\n") {
            2
        } else if self.text.ends_with('\n') || self.text.ends_with('\r') {
            1
        } else {
            0
        };
        let raw_cut = if self.raw.ends_with(b"\r\n") {
            2
        } else if self.raw.ends_with(b"\n") || self.raw.ends_with(b"\r") {
            1
        } else {
            0
        };
        Line {
            text: self.text[..self.text.len() - cut].to_string(),
            raw: self.raw[..self.raw.len() - raw_cut].to_vec(),
            number: self.number,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Line number reported for a failure in a (possibly empty) run of lines.
pub(crate) fn first_line_number(lines: &[Line], fallback: usize) -> usize {
    lines.first().map(Line::number).unwrap_or(fallback)
}

/// Stable error symbols surfaced to batch-submitting clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MissingBoundaryDelimiter,
    MissingCloseDelimiter,
    NoMatchWithBoundaryString,
    InvalidBoundary,
    MissingBoundary,
    InvalidChangesetBoundary,
    MissingContentType,
    InvalidContentType,
    MissingContentTransferEncoding,
    InvalidContentTransferEncoding,
    InvalidHeader,
    InvalidAcceptHeader,
    InvalidAcceptLanguageHeader,
    MissingBlankLine,
    InvalidQueryOperationMethod,
    InvalidChangesetMethod,
    InvalidRequestLine,
    InvalidUri,
    UnsupportedAbsolutePath,
    InvalidBodyForRequest,
    InvalidStatusLine,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingBoundaryDelimiter => "missing-boundary-delimiter",
            ErrorCode::MissingCloseDelimiter => "missing-close-delimiter",
            ErrorCode::NoMatchWithBoundaryString => "no-match-with-boundary-string",
            ErrorCode::InvalidBoundary => "invalid-boundary",
            ErrorCode::MissingBoundary => "missing-boundary",
            ErrorCode::InvalidChangesetBoundary => "invalid-changeset-boundary",
            ErrorCode::MissingContentType => "missing-content-type",
            ErrorCode::InvalidContentType => "invalid-content-type",
            ErrorCode::MissingContentTransferEncoding => "missing-content-transfer-encoding",
            ErrorCode::InvalidContentTransferEncoding => "invalid-content-transfer-encoding",
            ErrorCode::InvalidHeader => "invalid-header",
            ErrorCode::InvalidAcceptHeader => "invalid-accept-header",
            ErrorCode::InvalidAcceptLanguageHeader => "invalid-accept-language-header",
            ErrorCode::MissingBlankLine => "missing-blank-line",
            ErrorCode::InvalidQueryOperationMethod => "invalid-query-operation-method",
            ErrorCode::InvalidChangesetMethod => "invalid-changeset-method",
            ErrorCode::InvalidRequestLine => "invalid-request-line",
            ErrorCode::InvalidUri => "invalid-uri",
            ErrorCode::UnsupportedAbsolutePath => "unsupported-absolute-path",
            ErrorCode::InvalidBodyForRequest => "invalid-body-for-request",
            ErrorCode::InvalidStatusLine => "invalid-status-line",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while parsing a batch body.
///
/// Parsing is all-or-nothing: the first error aborts the whole call.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch body violates the multipart or HTTP message grammar.
    #[error("{code} at line {line}{}", format_params(.params))]
    Syntax {
        code: ErrorCode,
        params: Vec<String>,
        line: usize,
    },

    /// The underlying byte stream failed.
    #[error("failed to read batch body: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    pub fn syntax(code: ErrorCode, line: usize) -> Self {
        BatchError::Syntax {
            code,
            params: Vec::new(),
            line,
        }
    }

    /// Attach a content parameter (e.g. the offending boundary string).
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        if let BatchError::Syntax { params, .. } = &mut self {
            params.push(param.into());
        }
        self
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            BatchError::Syntax { code, .. } => Some(*code),
            BatchError::Io(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            BatchError::Syntax { line, .. } => Some(*line),
            BatchError::Io(_) => None,
        }
    }

    pub fn params(&self) -> &[String] {
        match self {
            BatchError::Syntax { params, .. } => params,
            BatchError::Io(_) => &[],
        }
    }
}

fn format_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!(" ({})", params.join(", "))
    }
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

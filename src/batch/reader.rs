//! Buffered line reader for batch bodies.
//!
//! # Responsibilities
//! - Split a byte stream on `\r\n`, `\n`, `\r` or end of stream, keeping the
//!   terminator in every returned line
//! - Number lines from 1
//! - Track the current boundary and body charset from `Content-Type` lines
//! - Decode structural lines (boundaries, headers) with a 1-byte charset and
//!   payload lines with the negotiated charset
//!
//! # Design Decisions
//! - The charset switch is driven by [`ReadState`], a three-state machine
//!   advanced by blank lines and reset by boundary lines
//! - The reader never fails on content; only the stream itself can error
//! - Raw bytes are kept next to the decoded text so bodies stay byte-exact

use std::io::{self, BufRead, BufReader, Read};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::batch::grammar;
use crate::batch::types::{BatchResult, Line};

/// Charset for boundary and header lines. `ISO-8859-1` resolves to this.
pub const STRUCTURAL_CHARSET: &Encoding = WINDOWS_1252;

const DEFAULT_CAPACITY: usize = 8 * 1024;

/// Position inside the current part, as far as charset selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Reading MIME headers right after a boundary.
    Header,
    /// Past the MIME header block; reading the HTTP start line and headers.
    PastFirstBlank,
    /// Past the HTTP header block; reading payload.
    Body,
}

/// Classification of a line for [`ReadState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Boundary,
    Other,
}

impl ReadState {
    pub fn next(self, kind: LineKind) -> ReadState {
        match (self, kind) {
            (_, LineKind::Boundary) => ReadState::Header,
            (ReadState::Header, LineKind::Blank) => ReadState::PastFirstBlank,
            (ReadState::PastFirstBlank, LineKind::Blank) => ReadState::Body,
            (state, _) => state,
        }
    }

    /// Whether lines read in this state are payload.
    pub fn is_body(self) -> bool {
        self == ReadState::Body
    }
}

/// Line reader over any byte stream.
pub struct BatchLineReader<R> {
    inner: BufReader<R>,
    buffer: Vec<u8>,
    pending_cr: bool,
    line_number: usize,
    state: ReadState,
    charset: &'static Encoding,
    outer_boundary: Option<String>,
    current_boundary: Option<String>,
}

impl<R: Read> BatchLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, inner),
            buffer: Vec::with_capacity(256),
            pending_cr: false,
            line_number: 0,
            state: ReadState::Header,
            charset: STRUCTURAL_CHARSET,
            outer_boundary: None,
            current_boundary: None,
        }
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Charset used for the next payload line.
    pub fn current_charset(&self) -> &'static Encoding {
        self.charset
    }

    /// Current boundary delimiter, including its leading `--`.
    pub fn current_boundary(&self) -> Option<&str> {
        self.current_boundary.as_deref()
    }

    /// Read the next line, or `None` at end of stream.
    pub fn read_line(&mut self) -> io::Result<Option<Line>> {
        self.buffer.clear();
        if !self.fill_line()? {
            return Ok(None);
        }
        self.line_number += 1;

        let encoding = if self.state.is_body() {
            self.charset
        } else {
            STRUCTURAL_CHARSET
        };
        let (text, _) = encoding.decode_without_bom_handling(&self.buffer);
        let text = text.into_owned();

        self.observe(&text);
        Ok(Some(Line::new(text, self.buffer.clone(), self.line_number)))
    }

    /// Drain the stream into a line list.
    pub fn to_lines(mut self) -> BatchResult<Vec<Line>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Append the next raw line (terminator included) to `self.buffer`.
    fn fill_line(&mut self) -> io::Result<bool> {
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                self.pending_cr = false;
                return Ok(!self.buffer.is_empty());
            }

            if self.pending_cr {
                // `\r` ended the previous chunk; swallow a following `\n`
                self.pending_cr = false;
                let lf = available[0] == b'\n';
                if lf {
                    self.buffer.push(b'\n');
                    self.inner.consume(1);
                }
                return Ok(true);
            }

            match available.iter().position(|b| *b == b'\r' || *b == b'\n') {
                Some(pos) => {
                    let is_cr = available[pos] == b'\r';
                    let next = available.get(pos + 1).copied();
                    self.buffer.extend_from_slice(&available[..=pos]);

                    if !is_cr {
                        self.inner.consume(pos + 1);
                        return Ok(true);
                    }
                    match next {
                        Some(b'\n') => {
                            self.buffer.push(b'\n');
                            self.inner.consume(pos + 2);
                            return Ok(true);
                        }
                        Some(_) => {
                            self.inner.consume(pos + 1);
                            return Ok(true);
                        }
                        None => {
                            self.inner.consume(pos + 1);
                            self.pending_cr = true;
                        }
                    }
                }
                None => {
                    let len = available.len();
                    self.buffer.extend_from_slice(available);
                    self.inner.consume(len);
                }
            }
        }
    }

    /// Update boundary, charset and read state after a line was read.
    fn observe(&mut self, text: &str) {
        let content = text.trim();

        if !self.state.is_body() {
            if let Some(value) = grammar::content_type_value(content) {
                self.on_content_type(value);
            }
        }

        let kind = if content.is_empty() && !text.is_empty() {
            LineKind::Blank
        } else if self.is_boundary(content) {
            LineKind::Boundary
        } else {
            LineKind::Other
        };

        if kind == LineKind::Boundary {
            self.charset = STRUCTURAL_CHARSET;
        }
        self.state = self.state.next(kind);
    }

    fn on_content_type(&mut self, value: &str) {
        if let Some(boundary) = grammar::parameter(value, "boundary") {
            self.current_boundary = Some(format!("--{}", boundary));
        }

        self.charset = match grammar::parameter(value, "charset") {
            Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or(STRUCTURAL_CHARSET),
            None if is_text_like(value) => UTF_8,
            None => STRUCTURAL_CHARSET,
        };
    }

    fn is_boundary(&mut self, content: &str) -> bool {
        if self.outer_boundary.is_none() {
            if content.is_empty() {
                return false;
            }
            // The first non-blank line is taken as the outer delimiter
            self.outer_boundary = Some(content.to_string());
            self.current_boundary = Some(content.to_string());
            return true;
        }

        if let Some(outer) = self.outer_boundary.as_deref() {
            if is_delimiter(content, outer) {
                self.current_boundary = Some(outer.to_string());
                return true;
            }
        }
        self.current_boundary
            .as_deref()
            .map(|current| is_delimiter(content, current))
            .unwrap_or(false)
    }
}

impl<R: Read> Iterator for BatchLineReader<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

fn is_delimiter(content: &str, boundary: &str) -> bool {
    content
        .strip_prefix(boundary)
        .map(|rest| rest.is_empty() || rest == "--")
        .unwrap_or(false)
}

/// JSON-compatible and XML-ish media types default to UTF-8.
fn is_text_like(content_type: &str) -> bool {
    let media_type = grammar::media_type(content_type);
    media_type.contains("json") || media_type.contains("xml")
}

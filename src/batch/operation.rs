//! HTTP-like messages embedded in a batch part.

use std::collections::VecDeque;

use crate::batch::grammar::{consume_blank_line, consume_headers};
use crate::batch::headers::{names, Headers};
use crate::batch::types::{first_line_number, BatchError, BatchResult, ErrorCode, Line};

/// One HTTP message: start line, headers, and verbatim body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOperation {
    start_line: Line,
    headers: Headers,
    body: Vec<Line>,
}

impl QueryOperation {
    /// Parse an operation. `fallback_line` is reported when `lines` is empty.
    pub fn parse(lines: Vec<Line>, strict: bool, fallback_line: usize) -> BatchResult<Self> {
        let mut lines = VecDeque::from(lines);

        let start_line = match lines.pop_front() {
            Some(line) if !line.is_blank() => line,
            Some(line) => {
                return Err(BatchError::syntax(
                    ErrorCode::InvalidQueryOperationMethod,
                    line.number(),
                ))
            }
            None => {
                return Err(BatchError::syntax(
                    ErrorCode::InvalidQueryOperationMethod,
                    fallback_line,
                ))
            }
        };

        let headers = consume_headers(&mut lines)?;
        consume_blank_line(&mut lines, strict)?;

        Ok(Self {
            start_line,
            headers,
            body: lines.into(),
        })
    }

    /// The request line (request direction) or status line (response direction).
    pub fn start_line(&self) -> &Line {
        &self.start_line
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[Line] {
        &self.body
    }

    /// Raw body bytes, exactly as they appeared on the wire.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.iter().flat_map(|l| l.raw().iter().copied()).collect()
    }

    /// True if any body line carries content.
    pub fn has_body_content(&self) -> bool {
        self.body.iter().any(|l| !l.is_blank())
    }
}

/// A member of a change set: MIME headers wrapping one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetPart {
    headers: Headers,
    operation: QueryOperation,
    first_line: usize,
}

impl ChangeSetPart {
    pub fn parse(lines: Vec<Line>, strict: bool, fallback_line: usize) -> BatchResult<Self> {
        let first_line = first_line_number(&lines, fallback_line);
        let mut lines = VecDeque::from(lines);

        let headers = consume_headers(&mut lines)?;
        consume_blank_line(&mut lines, strict)?;
        let operation = QueryOperation::parse(lines.into(), strict, first_line)?;

        Ok(Self {
            headers,
            operation,
            first_line,
        })
    }

    /// MIME headers of the member part.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn operation(&self) -> &QueryOperation {
        &self.operation
    }

    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Content-Id used to match this member with its response.
    pub fn content_id(&self) -> Option<String> {
        self.headers.get(names::CONTENT_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from_text(*t, i + 10))
            .collect()
    }

    #[test]
    fn test_parse_operation() {
        let op = QueryOperation::parse(
            lines(&[
                "POST People HTTP/1.1\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: 13\r\n",
                "\r\n",
                "{\"Name\":\"A\"}\r\n",
                "",
            ]),
            true,
            1,
        )
        .unwrap();

        assert_eq!(op.start_line().content(), "POST People HTTP/1.1");
        assert_eq!(op.headers().get("content-type").as_deref(), Some("application/json"));
        assert_eq!(op.body().len(), 2);
        assert_eq!(op.body_bytes(), b"{\"Name\":\"A\"}\r\n");
        assert!(op.has_body_content());
    }

    #[test]
    fn test_missing_start_line() {
        let err = QueryOperation::parse(Vec::new(), true, 42).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidQueryOperationMethod));
        assert_eq!(err.line(), Some(42));

        let err = QueryOperation::parse(lines(&["\r\n", "GET x HTTP/1.1"]), true, 1).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidQueryOperationMethod));
        assert_eq!(err.line(), Some(10));
    }

    #[test]
    fn test_operation_without_blank_line_in_strict_mode() {
        let err = QueryOperation::parse(
            lines(&["POST x HTTP/1.1\r\n", "Content-Id: 1\r\n", "{}\r\n"]),
            true,
            1,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MissingBlankLine));
        assert_eq!(err.line(), Some(12));

        let op = QueryOperation::parse(
            lines(&["POST x HTTP/1.1\r\n", "Content-Id: 1\r\n", "{}\r\n"]),
            false,
            1,
        )
        .unwrap();
        assert_eq!(op.body_bytes(), b"{}\r\n");
    }

    #[test]
    fn test_parse_change_set_part() {
        let part = ChangeSetPart::parse(
            lines(&[
                "Content-Type: application/http\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "Content-Id: 7\r\n",
                "\r\n",
                "DELETE People(1) HTTP/1.1\r\n",
                "\r\n",
                "",
            ]),
            true,
            1,
        )
        .unwrap();

        assert_eq!(part.content_id().as_deref(), Some("7"));
        assert_eq!(part.first_line(), 10);
        assert_eq!(part.operation().start_line().number(), 14);
        assert!(!part.operation().has_body_content());
    }
}

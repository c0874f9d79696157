//! Response-direction transformation (client side).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::batch::body_part::{BodyPart, PartContent};
use crate::batch::headers::{names, Headers};
use crate::batch::operation::QueryOperation;
use crate::batch::types::{BatchError, BatchResult, ErrorCode};
use crate::transform::common;
use crate::transform::BatchTransformator;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^HTTP/[0-9]\.[0-9] ([0-9]{3}) ([\S ]+)$").expect("valid regex")
});

/// One response recovered from a batch response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponse {
    status_code: u16,
    status_info: String,
    headers: Headers,
    body: Vec<u8>,
    content_id: Option<String>,
}

impl BatchResponse {
    pub fn new(status_code: u16, status_info: impl Into<String>) -> Self {
        Self {
            status_code,
            status_info: status_info.into(),
            headers: Headers::new(),
            body: Vec::new(),
            content_id: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.add(name, value, 0);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Reason phrase of the status line.
    pub fn status_info(&self) -> &str {
        &self.status_info
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }
}

/// Responses grouped the way they are written back (server side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponsePart {
    change_set: bool,
    responses: Vec<BatchResponse>,
}

impl BatchResponsePart {
    pub fn new(change_set: bool, responses: Vec<BatchResponse>) -> Self {
        Self {
            change_set,
            responses,
        }
    }

    pub fn is_change_set(&self) -> bool {
        self.change_set
    }

    pub fn responses(&self) -> &[BatchResponse] {
        &self.responses
    }
}

/// Builds a flat, ordered list of [`BatchResponse`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchResponseTransformator;

impl BatchResponseTransformator {
    pub fn new() -> Self {
        Self
    }

    fn create_response(
        &self,
        operation: &QueryOperation,
        part_content_id: Option<String>,
    ) -> BatchResult<BatchResponse> {
        let line = operation.start_line();
        let invalid = || {
            BatchError::syntax(ErrorCode::InvalidStatusLine, line.number())
                .with_param(line.content())
        };
        let captures = STATUS_LINE.captures(line.content().trim()).ok_or_else(invalid)?;
        let status_code = captures[1].parse::<u16>().map_err(|_| invalid())?;

        let content_id = part_content_id.or_else(|| operation.headers().get(names::CONTENT_ID));

        Ok(BatchResponse {
            status_code,
            status_info: captures[2].trim().to_string(),
            headers: operation.headers().clone(),
            body: common::resolve_body(operation)?,
            content_id,
        })
    }
}

impl BatchTransformator for BatchResponseTransformator {
    type Output = BatchResponse;

    fn transform(&self, part: &BodyPart) -> BatchResult<Vec<BatchResponse>> {
        match part.content() {
            PartContent::Single(operation) => {
                common::validate_content_type(part.headers(), false, part.first_line())?;
                common::validate_content_transfer_encoding(
                    part.headers(),
                    false,
                    part.first_line(),
                )?;
                Ok(vec![self.create_response(operation, part.content_id())?])
            }
            PartContent::ChangeSet(members) => members
                .iter()
                .map(|member| {
                    common::validate_content_type(member.headers(), false, member.first_line())?;
                    common::validate_content_transfer_encoding(
                        member.headers(),
                        true,
                        member.first_line(),
                    )?;
                    self.create_response(member.operation(), member.content_id())
                })
                .collect(),
        }
    }
}

//! Validation and body resolution shared by both transformators.

use crate::batch::grammar;
use crate::batch::headers::{names, Headers};
use crate::batch::operation::QueryOperation;
use crate::batch::types::{BatchError, BatchResult, ErrorCode};

const BINARY: &str = "binary";

/// Check the MIME `Content-Type` of a part carrying an operation.
pub fn validate_content_type(
    headers: &Headers,
    allow_multipart: bool,
    first_line: usize,
) -> BatchResult<()> {
    let content_type = headers
        .get(names::CONTENT_TYPE)
        .ok_or_else(|| BatchError::syntax(ErrorCode::MissingContentType, first_line))?;

    if grammar::is_application_http(&content_type)
        || (allow_multipart && grammar::is_multipart_mixed(&content_type))
    {
        return Ok(());
    }

    let line = headers.line_number(names::CONTENT_TYPE).unwrap_or(first_line);
    Err(BatchError::syntax(ErrorCode::InvalidContentType, line).with_param(content_type))
}

/// `Content-Transfer-Encoding` must be `binary`; change set members must declare it.
pub fn validate_content_transfer_encoding(
    headers: &Headers,
    mandatory: bool,
    first_line: usize,
) -> BatchResult<()> {
    match headers.field(names::CONTENT_TRANSFER_ENCODING) {
        Some(field) if field.value().eq_ignore_ascii_case(BINARY) => Ok(()),
        Some(field) => Err(
            BatchError::syntax(ErrorCode::InvalidContentTransferEncoding, field.line())
                .with_param(field.value()),
        ),
        None if mandatory => Err(BatchError::syntax(
            ErrorCode::MissingContentTransferEncoding,
            first_line,
        )),
        None => Ok(()),
    }
}

/// Declared `Content-Length`, if any.
pub fn content_length(headers: &Headers) -> BatchResult<Option<usize>> {
    let Some(field) = headers.field(names::CONTENT_LENGTH) else {
        return Ok(None);
    };

    field
        .value()
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| {
            BatchError::syntax(ErrorCode::InvalidHeader, field.line())
                .with_param(format!("{}: {}", field.name(), field.value()))
        })
}

/// Body bytes cut to `Content-Length`, or everything up to the end of the part.
pub fn resolve_body(operation: &QueryOperation) -> BatchResult<Vec<u8>> {
    let mut body = operation.body_bytes();
    if let Some(length) = content_length(operation.headers())? {
        body.truncate(length);
    }
    Ok(body)
}

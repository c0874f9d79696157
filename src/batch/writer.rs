//! Serialization of request and response groups back into a batch body.
//!
//! Output is always readable by [`BatchParser`](crate::batch::parser::BatchParser)
//! in strict mode: every part declares `Content-Transfer-Encoding: binary`,
//! every non-empty body carries a `Content-Length`.

use http::StatusCode;
use uuid::Uuid;

use crate::batch::headers::{names, Headers};
use crate::transform::{BatchRequest, BatchRequestPart, BatchResponse, BatchResponsePart};

const CRLF: &str = "\r\n";
const HTTP_VERSION: &str = "HTTP/1.1";

/// Headers recomputed by the writer instead of copied.
const SKIPPED_HEADERS: [&str; 4] = [
    names::CONTENT_LENGTH,
    names::CONTENT_ID,
    names::REQUEST_CONTENT_ID,
    names::MIME_HEADER_CONTENT_ID,
];

/// Writes batch bodies under one outer boundary.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    boundary: String,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchWriter {
    /// Writer with a random `batch_<uuid>` boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("batch_{}", Uuid::new_v4()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` of the whole batch.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Serialize request groups (client side).
    ///
    /// A change set becomes one part with its own boundary. Every request of
    /// a group that is not a change set gets a part of its own, so it reads
    /// back as a group of one. Empty change sets are left out.
    pub fn write_requests(&self, parts: &[BatchRequestPart]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            if part.is_change_set() {
                if !part.requests().is_empty() {
                    write_part(&mut out, &self.boundary, |out| {
                        write_change_set(out, part.requests(), write_request)
                    });
                }
            } else {
                for request in part.requests() {
                    write_part(&mut out, &self.boundary, |out| write_request(out, request));
                }
            }
        }
        write_close_delimiter(&mut out, &self.boundary);
        tracing::debug!(groups = parts.len(), bytes = out.len(), "Wrote batch request");
        out
    }

    /// Serialize response groups (server side).
    ///
    /// Grouping follows [`write_requests`](Self::write_requests); the flat
    /// response list read back is the same either way.
    pub fn write_responses(&self, parts: &[BatchResponsePart]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            if part.is_change_set() {
                if !part.responses().is_empty() {
                    write_part(&mut out, &self.boundary, |out| {
                        write_change_set(out, part.responses(), write_response)
                    });
                }
            } else {
                for response in part.responses() {
                    write_part(&mut out, &self.boundary, |out| write_response(out, response));
                }
            }
        }
        write_close_delimiter(&mut out, &self.boundary);
        tracing::debug!(groups = parts.len(), bytes = out.len(), "Wrote batch response");
        out
    }
}

/// Write one `--boundary` delimited part.
///
/// The content is followed by the CRLF that belongs to the next delimiter.
fn write_part(out: &mut Vec<u8>, boundary: &str, write_content: impl FnOnce(&mut Vec<u8>)) {
    push_line(out, &format!("--{}", boundary));
    write_content(out);
    out.extend_from_slice(CRLF.as_bytes());
}

fn write_close_delimiter(out: &mut Vec<u8>, boundary: &str) {
    push_line(out, &format!("--{}--", boundary));
}

fn write_change_set<T>(out: &mut Vec<u8>, items: &[T], write_item: fn(&mut Vec<u8>, &T)) {
    let boundary = format!("changeset_{}", Uuid::new_v4());
    push_line(
        out,
        &format!("{}: multipart/mixed; boundary={}", names::CONTENT_TYPE, boundary),
    );
    out.extend_from_slice(CRLF.as_bytes());
    for item in items {
        write_part(out, &boundary, |out| write_item(out, item));
    }
    write_close_delimiter(out, &boundary);
}

fn write_mime_headers(out: &mut Vec<u8>, content_id: Option<&str>) {
    push_line(out, &format!("{}: application/http", names::CONTENT_TYPE));
    push_line(out, &format!("{}: binary", names::CONTENT_TRANSFER_ENCODING));
    if let Some(id) = content_id {
        push_line(out, &format!("{}: {}", names::CONTENT_ID, id));
    }
    out.extend_from_slice(CRLF.as_bytes());
}

fn write_request(out: &mut Vec<u8>, request: &BatchRequest) {
    write_mime_headers(out, request.mime_content_id().as_deref());
    push_line(
        out,
        &format!("{} {} {}", request.method(), request.target(), HTTP_VERSION),
    );
    write_http_headers(out, request.headers());
    if let Some(id) = request.request_content_id() {
        push_line(out, &format!("{}: {}", names::CONTENT_ID, id));
    }
    write_body(out, request.body());
}

fn write_response(out: &mut Vec<u8>, response: &BatchResponse) {
    write_mime_headers(out, response.content_id());
    push_line(
        out,
        &format!(
            "{} {} {}",
            HTTP_VERSION,
            response.status_code(),
            reason_phrase(response)
        ),
    );
    write_http_headers(out, response.headers());
    write_body(out, response.body());
}

/// The response's own reason phrase, or the standard one for its code.
fn reason_phrase(response: &BatchResponse) -> &str {
    let info = response.status_info().trim();
    if !info.is_empty() {
        return info;
    }
    StatusCode::from_u16(response.status_code())
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

fn write_http_headers(out: &mut Vec<u8>, headers: &Headers) {
    for field in headers.iter() {
        if SKIPPED_HEADERS
            .iter()
            .any(|skipped| field.name().eq_ignore_ascii_case(skipped))
        {
            continue;
        }
        push_line(out, &format!("{}: {}", field.name(), field.value()));
    }
}

fn write_body(out: &mut Vec<u8>, body: &[u8]) {
    if !body.is_empty() {
        push_line(out, &format!("{}: {}", names::CONTENT_LENGTH, body.len()));
    }
    out.extend_from_slice(CRLF.as_bytes());
    out.extend_from_slice(body);
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(CRLF.as_bytes());
}

//! Request-direction transformation (server side).
//!
//! # Responsibilities
//! - Parse request lines into method, target and query parameters
//! - Enforce method placement (GET outside change sets, writes inside)
//! - Resolve targets against the service base URI
//! - Expose both Content-Id scopes to the dispatch layer

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::batch::body_part::{BodyPart, PartContent};
use crate::batch::headers::{names, Headers};
use crate::batch::operation::QueryOperation;
use crate::batch::types::{BatchError, BatchResult, ErrorCode};
use crate::transform::common;
use crate::transform::BatchTransformator;

static REQUEST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+) +(\S+) +(HTTP/[0-9]\.[0-9])$").expect("valid regex")
});

/// HTTP methods accepted inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Merge,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Merge => "MERGE",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "MERGE" => Ok(HttpMethod::Merge),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    method: HttpMethod,
    target: String,
    uri: Url,
    query_parameters: Vec<(String, String)>,
    headers: Headers,
    body: Vec<u8>,
}

impl BatchRequest {
    /// Create a request for `target`, already resolved to `uri`.
    pub fn new(method: HttpMethod, target: impl Into<String>, uri: Url) -> Self {
        let query_parameters = uri
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            method,
            target: target.into(),
            uri,
            query_parameters,
            headers: Headers::new(),
            body: Vec::new(),
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

    /// Set the Content-Id of the enclosing MIME part.
    pub fn with_content_id(mut self, content_id: &str) -> Self {
        self.headers.replace(names::MIME_HEADER_CONTENT_ID, content_id, 0);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Request target exactly as written on the request line.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query_parameters
    }

    /// First value of a query parameter.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> Option<String> {
        self.headers.get(names::CONTENT_TYPE)
    }

    /// Accepted media ranges, best quality first.
    pub fn accept(&self) -> &[String] {
        self.headers.values(names::ACCEPT)
    }

    pub fn accept_languages(&self) -> &[String] {
        self.headers.values(names::ACCEPT_LANGUAGE)
    }

    /// Content-Id from the HTTP message headers.
    pub fn request_content_id(&self) -> Option<String> {
        self.headers.get(names::REQUEST_CONTENT_ID)
    }

    /// Content-Id from the enclosing MIME part headers.
    pub fn mime_content_id(&self) -> Option<String> {
        self.headers.get(names::MIME_HEADER_CONTENT_ID)
    }

    /// Content-Id used for cross-referencing, MIME scope first.
    pub fn content_id(&self) -> Option<String> {
        self.mime_content_id().or_else(|| self.request_content_id())
    }
}

/// The requests recovered from one body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequestPart {
    change_set: bool,
    requests: Vec<BatchRequest>,
}

impl BatchRequestPart {
    pub fn new(change_set: bool, requests: Vec<BatchRequest>) -> Self {
        Self {
            change_set,
            requests,
        }
    }

    /// Whether the requests must be executed as one atomic unit.
    pub fn is_change_set(&self) -> bool {
        self.change_set
    }

    pub fn requests(&self) -> &[BatchRequest] {
        &self.requests
    }
}

/// Builds [`BatchRequestPart`]s resolved against a service base URI.
#[derive(Debug, Clone)]
pub struct BatchRequestTransformator {
    base_uri: Url,
}

impl BatchRequestTransformator {
    pub fn new(base_uri: Url) -> Self {
        Self { base_uri }
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    fn create_request(
        &self,
        operation: &QueryOperation,
        parent_headers: &Headers,
        change_set: bool,
    ) -> BatchResult<BatchRequest> {
        let line = operation.start_line();
        let captures = REQUEST_LINE.captures(line.content()).ok_or_else(|| {
            BatchError::syntax(ErrorCode::InvalidRequestLine, line.number())
                .with_param(line.content())
        })?;
        let method_token = &captures[1];
        let target = &captures[2];

        let method = method_token.parse::<HttpMethod>().map_err(|_| {
            BatchError::syntax(ErrorCode::InvalidRequestLine, line.number())
                .with_param(method_token)
        })?;
        validate_method(method, change_set, line.number())?;

        if method == HttpMethod::Get {
            if let Some(body_line) = operation.body().iter().find(|l| !l.is_blank()) {
                return Err(BatchError::syntax(
                    ErrorCode::InvalidBodyForRequest,
                    body_line.number(),
                ));
            }
        }

        let uri = self.resolve_target(target, line.number())?;
        let headers = transform_headers(operation.headers(), parent_headers);
        let body = common::resolve_body(operation)?;

        let mut request = BatchRequest::new(method, target, uri);
        request.headers = headers;
        request.body = body;
        Ok(request)
    }

    fn resolve_target(&self, target: &str, line: usize) -> BatchResult<Url> {
        let invalid = |code: ErrorCode| BatchError::syntax(code, line).with_param(target);
        let lower = target.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            if !target.starts_with(self.base_uri.as_str()) {
                return Err(invalid(ErrorCode::InvalidUri));
            }
            Url::parse(target).map_err(|_| invalid(ErrorCode::InvalidUri))
        } else if target.starts_with('/') {
            if !target.starts_with(self.base_uri.path()) {
                return Err(invalid(ErrorCode::UnsupportedAbsolutePath));
            }
            self.base_uri.join(target).map_err(|_| invalid(ErrorCode::InvalidUri))
        } else {
            self.base_uri.join(target).map_err(|_| invalid(ErrorCode::InvalidUri))
        }
    }
}

impl BatchTransformator for BatchRequestTransformator {
    type Output = BatchRequestPart;

    fn transform(&self, part: &BodyPart) -> BatchResult<Vec<BatchRequestPart>> {
        let requests = match part.content() {
            PartContent::Single(operation) => {
                common::validate_content_type(part.headers(), false, part.first_line())?;
                common::validate_content_transfer_encoding(
                    part.headers(),
                    false,
                    part.first_line(),
                )?;
                vec![self.create_request(operation, part.headers(), false)?]
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
                    self.create_request(member.operation(), member.headers(), true)
                })
                .collect::<BatchResult<Vec<_>>>()?,
        };

        tracing::trace!(
            line = part.first_line(),
            change_set = part.is_change_set(),
            requests = requests.len(),
            "Transformed request part"
        );
        Ok(vec![BatchRequestPart::new(part.is_change_set(), requests)])
    }
}

fn validate_method(method: HttpMethod, change_set: bool, line: usize) -> BatchResult<()> {
    match (change_set, method) {
        (true, HttpMethod::Get) => Err(
            BatchError::syntax(ErrorCode::InvalidChangesetMethod, line).with_param(method.as_str()),
        ),
        (false, HttpMethod::Get) | (true, _) => Ok(()),
        (false, _) => Err(
            BatchError::syntax(ErrorCode::InvalidQueryOperationMethod, line)
                .with_param(method.as_str()),
        ),
    }
}

/// Copy the operation headers and rename both Content-Id scopes.
fn transform_headers(operation_headers: &Headers, parent_headers: &Headers) -> Headers {
    let mut headers = operation_headers.clone();

    if let Some(field) = headers.remove(names::CONTENT_ID) {
        headers.replace(names::REQUEST_CONTENT_ID, &field.value(), field.line());
    }
    if let Some(field) = parent_headers.field(names::CONTENT_ID) {
        headers.replace(names::MIME_HEADER_CONTENT_ID, &field.value(), field.line());
    }
    headers
}

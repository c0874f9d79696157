//! Top-level sections of a batch body.

use std::collections::VecDeque;

use crate::batch::grammar::{self, consume_blank_line, consume_headers};
use crate::batch::headers::{names, Headers};
use crate::batch::operation::{ChangeSetPart, QueryOperation};
use crate::batch::splitter::BoundarySplitter;
use crate::batch::types::{first_line_number, BatchError, BatchResult, ErrorCode, Line};

/// Payload of a body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    /// `application/http`: exactly one operation.
    Single(QueryOperation),
    /// `multipart/mixed`: the members of an atomic change set.
    ChangeSet(Vec<ChangeSetPart>),
}

/// One section between two outer boundary delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    headers: Headers,
    content: PartContent,
    first_line: usize,
}

impl BodyPart {
    /// Parse a body part found under `outer_boundary`.
    pub fn parse(
        lines: Vec<Line>,
        outer_boundary: &str,
        strict: bool,
        fallback_line: usize,
    ) -> BatchResult<Self> {
        let first_line = first_line_number(&lines, fallback_line);
        let mut lines = VecDeque::from(lines);
        let headers = consume_headers(&mut lines)?;

        let content_type = headers
            .get(names::CONTENT_TYPE)
            .ok_or_else(|| BatchError::syntax(ErrorCode::MissingContentType, first_line))?;
        let content_type_line = headers.line_number(names::CONTENT_TYPE).unwrap_or(first_line);

        let content = if grammar::is_multipart_mixed(&content_type) {
            let boundary = grammar::boundary(&content_type, content_type_line)?;
            if boundary == outer_boundary {
                return Err(
                    BatchError::syntax(ErrorCode::InvalidChangesetBoundary, content_type_line)
                        .with_param(boundary),
                );
            }
            consume_blank_line(&mut lines, strict)?;

            let segments = BoundarySplitter::new(&boundary)?.split(lines.into())?;
            let members = segments
                .into_iter()
                .map(|segment| ChangeSetPart::parse(segment, strict, first_line))
                .collect::<BatchResult<Vec<_>>>()?;
            PartContent::ChangeSet(members)
        } else if grammar::is_application_http(&content_type) {
            consume_blank_line(&mut lines, strict)?;
            PartContent::Single(QueryOperation::parse(lines.into(), strict, first_line)?)
        } else {
            return Err(
                BatchError::syntax(ErrorCode::InvalidContentType, content_type_line)
                    .with_param(content_type),
            );
        };

        Ok(Self {
            headers,
            content,
            first_line,
        })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn content(&self) -> &PartContent {
        &self.content
    }

    pub fn is_change_set(&self) -> bool {
        matches!(self.content, PartContent::ChangeSet(_))
    }

    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Content-Id declared on the body part's own MIME headers.
    pub fn content_id(&self) -> Option<String> {
        self.headers.get(names::CONTENT_ID)
    }

    /// Number of operations carried by this part.
    pub fn operation_count(&self) -> usize {
        match &self.content {
            PartContent::Single(_) => 1,
            PartContent::ChangeSet(members) => members.len(),
        }
    }
}

//! Batch orchestrator: one linear pass from bytes to transformed parts.

use std::io::Read;

use url::Url;

use crate::batch::body_part::BodyPart;
use crate::batch::grammar;
use crate::batch::reader::BatchLineReader;
use crate::batch::splitter::BoundarySplitter;
use crate::batch::types::BatchResult;
use crate::config::schema::ParserConfig;
use crate::transform::{
    BatchRequestPart, BatchRequestTransformator, BatchResponse, BatchResponseTransformator,
    BatchTransformator,
};

/// Line reported for problems with the declared content type itself.
const CONTENT_TYPE_LINE: usize = 1;

/// Parser for one declared batch content type.
#[derive(Debug, Clone)]
pub struct BatchParser {
    content_type: String,
    base_uri: Url,
    strict: bool,
}

impl BatchParser {
    /// Create a parser for a body declared as `content_type`.
    ///
    /// `base_uri` is the service root that relative request targets resolve
    /// against; it should end with `/`.
    pub fn new(content_type: impl Into<String>, base_uri: Url, strict: bool) -> Self {
        Self {
            content_type: content_type.into(),
            base_uri,
            strict,
        }
    }

    pub fn from_config(
        content_type: impl Into<String>,
        config: &ParserConfig,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(content_type, config.base_url()?, config.strict))
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Read `input` to the end and split it into body parts.
    pub fn parse_body_parts<R: Read>(&self, input: R) -> BatchResult<Vec<BodyPart>> {
        let boundary = grammar::boundary(&self.content_type, CONTENT_TYPE_LINE)?;
        tracing::debug!(boundary = %boundary, strict = self.strict, "Parsing batch body");

        let lines = BatchLineReader::new(input).to_lines()?;
        let line_count = lines.len();
        let segments = BoundarySplitter::new(&boundary)?.split(lines)?;

        let parts = segments
            .into_iter()
            .map(|segment| BodyPart::parse(segment, &boundary, self.strict, CONTENT_TYPE_LINE))
            .collect::<BatchResult<Vec<_>>>()?;

        tracing::debug!(lines = line_count, parts = parts.len(), "Batch body split into parts");
        Ok(parts)
    }

    /// Parse `input` and feed every body part through `transformator`.
    pub fn parse<R, T>(&self, input: R, transformator: &T) -> BatchResult<Vec<T::Output>>
    where
        R: Read,
        T: BatchTransformator,
    {
        let mut results = Vec::new();
        for part in self.parse_body_parts(input)? {
            results.extend(transformator.transform(&part)?);
        }
        Ok(results)
    }

    /// Parse a batch request body (server side).
    pub fn parse_requests<R: Read>(&self, input: R) -> BatchResult<Vec<BatchRequestPart>> {
        let transformator = BatchRequestTransformator::new(self.base_uri.clone());
        let parts = self.parse(input, &transformator)?;
        tracing::debug!(
            groups = parts.len(),
            change_sets = parts.iter().filter(|p| p.is_change_set()).count(),
            "Parsed batch request"
        );
        Ok(parts)
    }

    /// Parse a batch response body (client side).
    pub fn parse_responses<R: Read>(&self, input: R) -> BatchResult<Vec<BatchResponse>> {
        let responses = self.parse(input, &BatchResponseTransformator::new())?;
        tracing::debug!(responses = responses.len(), "Parsed batch response");
        Ok(responses)
    }
}

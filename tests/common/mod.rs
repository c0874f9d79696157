//! Shared fixtures for the batch integration tests.

#![allow(dead_code)]

use odata_batch::BatchParser;
use url::Url;

pub const BOUNDARY: &str = "batch_123";
pub const BASE_URI: &str = "http://localhost/odata/";

pub fn content_type(boundary: &str) -> String {
    format!("multipart/mixed; boundary={}", boundary)
}

pub fn parser(strict: bool) -> BatchParser {
    parser_for(BOUNDARY, strict)
}

pub fn parser_for(boundary: &str, strict: bool) -> BatchParser {
    BatchParser::new(content_type(boundary), Url::parse(BASE_URI).unwrap(), strict)
}

/// Join lines with CRLF, terminating the last one too.
pub fn crlf(lines: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push_str("\r\n");
    }
    body.into_bytes()
}

/// One member of a change set.
pub struct Member<'a> {
    pub content_id: &'a str,
    pub method: &'a str,
    pub target: &'a str,
    pub body: Option<&'a str>,
}

/// Builds batch bodies line by line under one outer boundary.
pub struct BatchBuilder {
    boundary: String,
    lines: Vec<String>,
}

impl BatchBuilder {
    pub fn new(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    fn delimiter(self) -> Self {
        let delimiter = format!("--{}", self.boundary);
        self.line(&delimiter)
    }

    fn mime_headers(self, content_id: Option<&str>) -> Self {
        let builder = self
            .line("Content-Type: application/http")
            .line("Content-Transfer-Encoding: binary");
        let builder = match content_id {
            Some(id) => builder.line(&format!("Content-Id: {}", id)),
            None => builder,
        };
        builder.line("")
    }

    /// A GET query part.
    pub fn query(self, target: &str) -> Self {
        self.delimiter()
            .mime_headers(None)
            .line(&format!("GET {} HTTP/1.1", target))
            .line("")
    }

    /// A change set part under `inner` with the given members.
    pub fn change_set(self, inner: &str, members: &[Member<'_>]) -> Self {
        let mut builder = self
            .delimiter()
            .line(&format!("Content-Type: multipart/mixed; boundary={}", inner))
            .line("");
        for member in members {
            builder = builder
                .line(&format!("--{}", inner))
                .mime_headers(Some(member.content_id))
                .line(&format!("{} {} HTTP/1.1", member.method, member.target));
            builder = match member.body {
                Some(body) => builder
                    .line("Content-Type: application/json")
                    .line("")
                    .line(body),
                None => builder.line("").line(""),
            };
        }
        builder.line(&format!("--{}--", inner)).line("")
    }

    /// A single response part.
    pub fn response(self, status_line: &str, content_id: Option<&str>, body: Option<&str>) -> Self {
        let builder = self.delimiter().mime_headers(content_id).line(status_line);
        match body {
            Some(body) => builder
                .line("Content-Type: application/json")
                .line(&format!("Content-Length: {}", body.len()))
                .line("")
                .line(body),
            None => builder.line("").line(""),
        }
    }

    /// Close the batch and render it.
    pub fn build(self) -> Vec<u8> {
        let close = format!("--{}--", self.boundary);
        let builder = self.line(&close);
        let lines: Vec<&str> = builder.lines.iter().map(String::as_str).collect();
        crlf(&lines)
    }
}

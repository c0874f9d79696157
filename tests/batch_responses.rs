//! Response-direction integration tests: bytes in, flat response list out.

use odata_batch::{BatchResponse, BatchResponsePart, BatchWriter, ErrorCode};

mod common;
use common::{crlf, parser_for, BatchBuilder};

const BOUNDARY: &str = "batchresponse_1";

#[test]
fn test_no_content_without_length() {
    let body = BatchBuilder::new(BOUNDARY)
        .response("HTTP/1.1 204 No Content", None, None)
        .build();

    let responses = parser_for(BOUNDARY, true)
        .parse_responses(body.as_slice())
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_code(), 204);
    assert_eq!(responses[0].status_info(), "No Content");
    assert!(responses[0].body().is_empty());
    assert_eq!(responses[0].content_id(), None);
}

#[test]
fn test_single_response_with_body() {
    let body = BatchBuilder::new(BOUNDARY)
        .response("HTTP/1.1 200 OK", Some("7"), Some(r#"{"value":[]}"#))
        .build();

    let responses = parser_for(BOUNDARY, true)
        .parse_responses(body.as_slice())
        .unwrap();
    assert_eq!(responses[0].status_code(), 200);
    assert_eq!(responses[0].body(), br#"{"value":[]}"#);
    assert_eq!(responses[0].content_id(), Some("7"));
    assert_eq!(
        responses[0].headers().get("content-type").as_deref(),
        Some("application/json")
    );
}

#[test]
fn test_change_set_responses_are_flattened() {
    let body = crlf(&[
        "--batchresponse_1",
        "Content-Type: multipart/mixed; boundary=changesetresponse_1",
        "",
        "--changesetresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "Content-Id: 1",
        "",
        "HTTP/1.1 201 Created",
        "Content-Type: application/json",
        "Content-Length: 8",
        "",
        r#"{"Id":1}"#,
        "--changesetresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "Content-Id: 2",
        "",
        "HTTP/1.1 204 No Content",
        "",
        "",
        "--changesetresponse_1--",
        "",
        "--batchresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "HTTP/1.1 200 OK",
        "Content-Type: application/json",
        "",
        r#"{"value":[]}"#,
        "--batchresponse_1--",
    ]);

    let responses = parser_for(BOUNDARY, true)
        .parse_responses(body.as_slice())
        .unwrap();
    let summary: Vec<(u16, Option<&str>)> = responses
        .iter()
        .map(|r| (r.status_code(), r.content_id()))
        .collect();
    assert_eq!(summary, vec![(201, Some("1")), (204, Some("2")), (200, None)]);
    assert_eq!(responses[0].body(), br#"{"Id":1}"#);
    assert!(responses[1].body().is_empty());
    assert_eq!(responses[2].body(), br#"{"value":[]}"#);
}

#[test]
fn test_content_id_falls_back_to_operation_header() {
    let body = crlf(&[
        "--batchresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "HTTP/1.1 204 No Content",
        "Content-Id: 9",
        "",
        "",
        "--batchresponse_1--",
    ]);

    let responses = parser_for(BOUNDARY, true)
        .parse_responses(body.as_slice())
        .unwrap();
    assert_eq!(responses[0].content_id(), Some("9"));
}

#[test]
fn test_invalid_status_line() {
    let body = crlf(&[
        "--batchresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "HTTP/1.1 OK",
        "",
        "",
        "--batchresponse_1--",
    ]);

    let err = parser_for(BOUNDARY, true)
        .parse_responses(body.as_slice())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidStatusLine));
    assert_eq!(err.line(), Some(5));
}

#[test]
fn test_part_header_errors() {
    let missing_type = crlf(&[
        "--batchresponse_1",
        "Content-Transfer-Encoding: binary",
        "",
        "HTTP/1.1 200 OK",
        "",
        "",
        "--batchresponse_1--",
    ]);
    let err = parser_for(BOUNDARY, true)
        .parse_responses(missing_type.as_slice())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::MissingContentType));
    assert_eq!(err.line(), Some(2));

    let wrong_type = crlf(&[
        "--batchresponse_1",
        "Content-Type: text/plain",
        "",
        "HTTP/1.1 200 OK",
        "",
        "",
        "--batchresponse_1--",
    ]);
    let err = parser_for(BOUNDARY, true)
        .parse_responses(wrong_type.as_slice())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidContentType));
    assert_eq!(err.line(), Some(2));

    let wrong_encoding = crlf(&[
        "--batchresponse_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: base64",
        "",
        "HTTP/1.1 200 OK",
        "",
        "",
        "--batchresponse_1--",
    ]);
    let err = parser_for(BOUNDARY, true)
        .parse_responses(wrong_encoding.as_slice())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidContentTransferEncoding));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_declared_content_type_without_boundary() {
    let body = BatchBuilder::new(BOUNDARY)
        .response("HTTP/1.1 200 OK", None, None)
        .build();

    let err = odata_batch::BatchParser::new(
        "multipart/mixed",
        url::Url::parse(common::BASE_URI).unwrap(),
        true,
    )
    .parse_responses(body.as_slice())
    .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::MissingBoundary));
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_writer_round_trip() {
    let parts = vec![
        BatchResponsePart::new(
            true,
            vec![
                BatchResponse::new(201, "Created")
                    .with_header("Content-Type", "application/json")
                    .with_body(r#"{"Id":1}"#)
                    .with_content_id("1"),
                BatchResponse::new(204, "No Content").with_content_id("2"),
            ],
        ),
        BatchResponsePart::new(
            false,
            vec![
                BatchResponse::new(200, "OK").with_body("hello\r\n"),
                BatchResponse::new(404, "Not Found")
                    .with_header("Content-Type", "text/plain")
                    .with_body("missing"),
            ],
        ),
    ];

    let writer = BatchWriter::new();
    let body = writer.write_responses(&parts);
    let responses = parser_for(writer.boundary(), true)
        .parse_responses(body.as_slice())
        .unwrap();

    let expected: Vec<&BatchResponse> = parts.iter().flat_map(|p| p.responses()).collect();
    assert_eq!(responses.len(), expected.len());
    for (parsed, original) in responses.iter().zip(expected) {
        assert_eq!(parsed.status_code(), original.status_code());
        assert_eq!(parsed.status_info(), original.status_info());
        assert_eq!(parsed.content_id(), original.content_id());
        assert_eq!(parsed.body(), original.body());
    }
}

//! `odata-batch`: inspect OData `$batch` multipart bodies.
//!
//! Reads a batch body from a file or stdin, parses it as a request batch
//! (server view) or a response batch (client view) and prints a JSON summary.
//!
//! ```text
//! odata-batch [--config FILE] [--content-type CT] [--base-uri URI]
//!             [--lenient] [--direction request|response] [FILE]
//! ```
//!
//! Without `--content-type` the outer boundary is taken from the first
//! non-blank line of the body.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use odata_batch::batch::Headers;
use odata_batch::config::loader::{load_config, ConfigError};
use odata_batch::config::validation::validate_config;
use odata_batch::observability::init_logging;
use odata_batch::{
    BatchConfig, BatchError, BatchParser, BatchRequest, BatchRequestPart, BatchResponse,
};

#[derive(Parser)]
#[command(name = "odata-batch")]
#[command(about = "Parse and inspect OData $batch multipart bodies", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Declared Content-Type of the body (e.g. "multipart/mixed; boundary=batch_1")
    #[arg(short = 't', long)]
    content_type: Option<String>,

    /// Service root for relative request targets (overrides the config)
    #[arg(short, long)]
    base_uri: Option<String>,

    /// Tolerate grammar deviations such as a missing blank line
    #[arg(long)]
    lenient: bool,

    /// Which side of the exchange the body is
    #[arg(short, long, value_enum, default_value_t = Direction::Request)]
    direction: Direction,

    /// Batch body to read; stdin when omitted
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Request,
    Response,
}

#[derive(Serialize)]
struct RequestGroupSummary {
    change_set: bool,
    requests: Vec<RequestSummary>,
}

#[derive(Serialize)]
struct RequestSummary {
    method: String,
    uri: String,
    content_id: Option<String>,
    headers: HashMap<String, Vec<String>>,
    body: String,
}

#[derive(Serialize)]
struct ResponseSummary {
    status_code: u16,
    status_info: String,
    content_id: Option<String>,
    headers: HashMap<String, Vec<String>>,
    body: String,
}

#[derive(Serialize)]
struct ErrorSummary {
    error: String,
    line: Option<usize>,
    params: Vec<String>,
    message: String,
}

impl From<&BatchRequestPart> for RequestGroupSummary {
    fn from(part: &BatchRequestPart) -> Self {
        Self {
            change_set: part.is_change_set(),
            requests: part.requests().iter().map(RequestSummary::from).collect(),
        }
    }
}

impl From<&BatchRequest> for RequestSummary {
    fn from(request: &BatchRequest) -> Self {
        Self {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            content_id: request.content_id(),
            headers: header_map(request.headers()),
            body: String::from_utf8_lossy(request.body()).into_owned(),
        }
    }
}

impl From<&BatchResponse> for ResponseSummary {
    fn from(response: &BatchResponse) -> Self {
        Self {
            status_code: response.status_code(),
            status_info: response.status_info().to_string(),
            content_id: response.content_id().map(str::to_string),
            headers: header_map(response.headers()),
            body: String::from_utf8_lossy(response.body()).into_owned(),
        }
    }
}

impl From<&BatchError> for ErrorSummary {
    fn from(err: &BatchError) -> Self {
        Self {
            error: err.code().map_or("io", |code| code.as_str()).to_string(),
            line: err.line(),
            params: err.params().to_vec(),
            message: err.to_string(),
        }
    }
}

fn header_map(headers: &Headers) -> HashMap<String, Vec<String>> {
    headers.to_multi_map()
}

/// Derive a content type from the first delimiter line of the body.
fn sniff_content_type(body: &[u8]) -> Option<String> {
    String::from_utf8_lossy(body)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.strip_prefix("--"))
        .filter(|boundary| !boundary.is_empty())
        .map(|boundary| format!("multipart/mixed; boundary=\"{}\"", boundary))
}

fn read_input(file: Option<&PathBuf>) -> std::io::Result<Vec<u8>> {
    if let Some(path) = file {
        return std::fs::read(path);
    }
    let mut body = Vec::new();
    std::io::stdin().read_to_end(&mut body)?;
    Ok(body)
}

fn load(cli: &Cli) -> Result<BatchConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BatchConfig::default(),
    };
    if let Some(base_uri) = &cli.base_uri {
        config.parser.base_uri = base_uri.clone();
    }
    if cli.lenient {
        config.parser.strict = false;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli, config: &BatchConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let body = read_input(cli.file.as_ref())?;

    let Some(content_type) = cli.content_type.clone().or_else(|| sniff_content_type(&body)) else {
        eprintln!("Error: no --content-type given and no boundary line found in the body");
        return Ok(ExitCode::from(2));
    };

    let parser = BatchParser::from_config(content_type, &config.parser)?;
    tracing::info!(
        content_type = %parser.content_type(),
        base_uri = %parser.base_uri(),
        strict = parser.is_strict(),
        bytes = body.len(),
        "Parsing batch"
    );

    let outcome = match cli.direction {
        Direction::Request => parser.parse_requests(body.as_slice()).map(|parts| {
            let summary: Vec<RequestGroupSummary> = parts.iter().map(Into::into).collect();
            print_json(&summary)
        }),
        Direction::Response => parser.parse_responses(body.as_slice()).map(|responses| {
            let summary: Vec<ResponseSummary> = responses.iter().map(Into::into).collect();
            print_json(&summary)
        }),
    };

    match outcome {
        Ok(printed) => {
            printed?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, "Batch rejected");
            eprintln!("{}", serde_json::to_string_pretty(&ErrorSummary::from(&err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Warning: logging not initialized: {}", e);
    }

    match run(&cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

//! Batch multipart parsing engine.
//!
//! # Data Flow
//! ```text
//! declared Content-Type ──► grammar.rs (outer boundary)
//! byte stream
//!     → reader.rs   (numbered lines, charset/boundary tracking)
//!     → splitter.rs (parts between outer delimiters)
//!     → body_part.rs (MIME headers; application/http | multipart/mixed)
//!         → operation.rs (QueryOperation, ChangeSetPart via inner boundary)
//!     → transform/   (requests or responses)
//!
//! Reverse direction:
//!     request / response groups → writer.rs → multipart body
//! ```
//!
//! # Design Decisions
//! - One synchronous pass per call; nothing outlives the returned value
//! - All-or-nothing: the first grammar violation aborts the call
//! - Every error carries a stable code and the 1-based line it was found on
//! - Strict mode rejects missing blank lines; lenient mode logs and continues

pub mod accept;
pub mod body_part;
pub mod grammar;
pub mod headers;
pub mod operation;
pub mod parser;
pub mod reader;
pub mod splitter;
pub mod types;
pub mod writer;

pub use body_part::{BodyPart, PartContent};
pub use headers::{HeaderField, Headers};
pub use operation::{ChangeSetPart, QueryOperation};
pub use parser::BatchParser;
pub use reader::{BatchLineReader, ReadState};
pub use types::{BatchError, BatchResult, ErrorCode, Line};
pub use writer::BatchWriter;

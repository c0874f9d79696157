//! OData `$batch` multipart parsing and serialization library

pub mod batch;
pub mod config;
pub mod observability;
pub mod transform;

pub use batch::{BatchError, BatchParser, BatchResult, BatchWriter, ErrorCode};
pub use config::schema::BatchConfig;
pub use transform::{
    BatchRequest, BatchRequestPart, BatchResponse, BatchResponsePart, BatchTransformator,
    HttpMethod,
};

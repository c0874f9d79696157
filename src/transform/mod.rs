//! Direction-specific transformation of parsed body parts.
//!
//! # Data Flow
//! ```text
//! BodyPart (headers + operation | change set members)
//!     → common.rs (Content-Type / Content-Transfer-Encoding checks,
//!                  Content-Length body resolution)
//!     → request.rs  → BatchRequestPart (server side, ready for dispatch)
//!     → response.rs → BatchResponse    (client side, ready for reading)
//! ```
//!
//! # Design Decisions
//! - Both directions share one trait so the orchestrator stays generic
//! - Validation that depends on direction (methods, status lines) lives in
//!   the direction's own module

pub mod common;
pub mod request;
pub mod response;

use crate::batch::body_part::BodyPart;
use crate::batch::types::BatchResult;

pub use request::{BatchRequest, BatchRequestPart, BatchRequestTransformator, HttpMethod};
pub use response::{BatchResponse, BatchResponsePart, BatchResponseTransformator};

/// Turns one parsed body part into direction-specific results.
pub trait BatchTransformator {
    type Output;

    fn transform(&self, part: &BodyPart) -> BatchResult<Vec<Self::Output>>;
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! batch parser / transformators / writer
//!     → tracing events (debug per part, warn on lenient recoveries)
//!     → logging.rs (EnvFilter + fmt layer on stderr)
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; the binary owns subscriber setup
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! settings subsystem produces:
//!     → structured log events (load outcome, field changes, save failures)
//!
//! Consumers:
//!     → stderr via logging.rs
//! ```

pub mod logging;

pub use logging::init_logging;

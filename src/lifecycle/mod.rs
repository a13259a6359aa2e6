//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open store → Load → Apply
//! ```
//!
//! # Design Decisions
//! - One explicit initialization point, no lazy globals
//! - The store is shared by `Arc` handle

pub mod startup;

pub use startup::startup;

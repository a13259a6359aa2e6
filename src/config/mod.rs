//! Configuration of the settings engine.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StoreConfig (validated, immutable)
//!     → lifecycle::startup builds the store from it
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty or missing file is valid
//! - Validation separates syntactic (serde) from semantic checks
//! - This is not the user's settings blob; that lives in `crate::settings`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{LoggingConfig, StorageConfig, StoreConfig};

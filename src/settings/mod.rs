//! Settings engine.
//!
//! # Data Flow
//! ```text
//! startup:
//!     persistence.rs (read blob, check ABI version)
//!     → store.rs (current Fields replaced, no hooks)
//!     → apply() runs every live hook once
//!
//! on edit:
//!     store.rs ModifiableAccessor (locked working copy)
//!     → dispatch.rs diff (entry state vs exit state)
//!     → persistence.rs save (all fields + ABI version)
//!     → current Fields replaced, lock released
//!     → dispatch.rs runs hooks of changed fields
//! ```
//!
//! # Design Decisions
//! - `fields.rs` is the only place that names individual settings
//! - Sensitive values are persisted but never logged or exported
//! - Deprecated values are persisted but never applied

pub mod dispatch;
pub mod error;
pub mod export;
pub mod fields;
pub mod hooks;
pub mod persistence;
pub mod store;

pub use dispatch::ChangeSet;
pub use error::{Result, SettingsError};
pub use export::export;
pub use fields::{
    field, set_by_name, FieldDescriptor, Fields, TrayIconBatteryBehavior, Value, ValueKind,
    FIELDS, FIELDS_ABI_VERSION,
};
pub use hooks::{ApplyHooks, LoggingHooks, NoopHooks};
pub use persistence::{Blob, FileBackend, LoadResult, MemoryBackend, SettingsBackend};
pub use store::{ConstAccessor, ModifiableAccessor, SettingsStore};

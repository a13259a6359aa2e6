//! Settings engine for the earbuds desktop companion.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod settings;

pub use config::StoreConfig;
pub use settings::{
    ApplyHooks, Fields, LoadResult, ModifiableAccessor, SettingsError, SettingsStore,
    FIELDS_ABI_VERSION,
};

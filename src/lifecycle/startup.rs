//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the store on the configured file
//! - Load persisted settings
//! - Apply every setting once so dependent subsystems start in sync
//!
//! # Design Decisions
//! - Fail fast: a storage read error is returned, not defaulted
//! - Apply runs for every load outcome, since defaults need propagating too

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::settings::{ApplyHooks, FileBackend, LoadResult, Result, SettingsStore};

/// Build, load and apply. Returns the store handle and the load outcome so
/// the caller can tell the user when settings were reset.
pub fn startup(
    config: &StoreConfig,
    hooks: Arc<dyn ApplyHooks>,
) -> Result<(Arc<SettingsStore>, LoadResult)> {
    let store = Arc::new(open(config, hooks));
    let result = store.load()?;

    tracing::info!(
        path = ?config.storage.path,
        outcome = %result,
        "Settings store ready"
    );

    store.apply();
    Ok((store, result))
}

/// Build the store without loading.
pub fn open(config: &StoreConfig, hooks: Arc<dyn ApplyHooks>) -> SettingsStore {
    SettingsStore::new(FileBackend::new(&config.storage.path), hooks)
}

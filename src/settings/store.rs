//! The settings store and its scoped accessors.
//!
//! # Write path
//! ```text
//! modifiable_access()
//!     → lock, capture old fields, hand out a working copy
//!     → caller mutates the working copy
//! commit() / drop
//!     → diff old vs working
//!     → persist working (all fields)
//!     → replace current, release lock
//!     → run hooks of changed fields (lock-free)
//! ```
//!
//! Write accessors are serialized by the lock. Hooks run after release, so a
//! hook may open another accessor without deadlocking.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::settings::dispatch::{self, ChangeSet};
use crate::settings::error::Result;
use crate::settings::fields::Fields;
use crate::settings::hooks::ApplyHooks;
use crate::settings::persistence::{self, LoadResult, SettingsBackend};

/// Owns the current `Fields`, the storage backend and the hooks.
pub struct SettingsStore {
    current: Mutex<Fields>,
    backend: Box<dyn SettingsBackend>,
    hooks: Arc<dyn ApplyHooks>,
}

impl SettingsStore {
    /// Create a store holding schema defaults. Nothing is read until `load`.
    pub fn new(backend: impl SettingsBackend + 'static, hooks: Arc<dyn ApplyHooks>) -> Self {
        Self {
            current: Mutex::new(Fields::default()),
            backend: Box::new(backend),
            hooks,
        }
    }

    /// Replace the current fields with the persisted ones. Hooks are not run.
    ///
    /// On `NoAbiField` and `AbiIncompatible` the current fields are reset to
    /// defaults. The blob is left untouched either way.
    ///
    /// The lock is held across the read, so a concurrent commit lands either
    /// before the read or after the replacement.
    pub fn load(&self) -> Result<LoadResult> {
        let mut current = self.lock();
        let (result, fields) = persistence::load(self.backend.as_ref())?;

        match result {
            LoadResult::Successful => tracing::info!(?fields, "Settings loaded"),
            LoadResult::NoAbiField => {
                tracing::warn!("No versioned settings found, using defaults")
            }
            LoadResult::AbiIncompatible => {
                tracing::warn!("Stored settings are incompatible with this build, using defaults")
            }
        }

        *current = fields;
        Ok(result)
    }

    /// Run every live hook with the current value as both old and new.
    pub fn apply(&self) {
        let fields = self.get_current();
        tracing::debug!("Applying all settings");
        dispatch::dispatch_all(self.hooks.as_ref(), &fields);
    }

    /// Copy of the current fields.
    pub fn get_current(&self) -> Fields {
        self.lock().clone()
    }

    /// Schema defaults. Does not touch the store.
    pub fn get_default() -> Fields {
        Fields::default()
    }

    /// Lock the store for a consistent multi-field read.
    pub fn access(&self) -> ConstAccessor<'_> {
        ConstAccessor { guard: self.lock() }
    }

    /// Lock the store for mutation. Changes are committed when the accessor
    /// is committed or dropped.
    pub fn modifiable_access(&self) -> ModifiableAccessor<'_> {
        let guard = self.lock();
        let old = guard.clone();
        ModifiableAccessor {
            store: self,
            working: old.clone(),
            old,
            guard: Some(guard),
        }
    }

    /// Run `f` inside a write accessor and commit. The commit happens even if
    /// `f` reports an error through its return value.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Fields) -> R) -> Result<R> {
        let mut accessor = self.modifiable_access();
        let out = f(&mut *accessor);
        accessor.commit()?;
        Ok(out)
    }

    /// Set every field back to its default.
    pub fn reset(&self) -> Result<ChangeSet> {
        let mut accessor = self.modifiable_access();
        *accessor = Fields::default();
        accessor.commit()
    }

    // A panicking accessor poisons the mutex; the fields it guards are
    // always a committed value, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Fields> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.get_current())
            .finish_non_exhaustive()
    }
}

/// Read-only view that holds the store lock.
pub struct ConstAccessor<'a> {
    guard: MutexGuard<'a, Fields>,
}

impl Deref for ConstAccessor<'_> {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.guard
    }
}

/// Exclusive mutable view over a working copy of the fields.
pub struct ModifiableAccessor<'a> {
    store: &'a SettingsStore,
    old: Fields,
    working: Fields,
    /// `None` once committed.
    guard: Option<MutexGuard<'a, Fields>>,
}

impl ModifiableAccessor<'_> {
    /// Fields as they were when the accessor was opened.
    pub fn old(&self) -> &Fields {
        &self.old
    }

    /// Commit now and report persistence failures.
    ///
    /// The in-memory commit and hooks happen even when persisting fails.
    pub fn commit(mut self) -> Result<ChangeSet> {
        self.finish()
    }

    fn finish(&mut self) -> Result<ChangeSet> {
        let Some(mut guard) = self.guard.take() else {
            return Ok(ChangeSet::default());
        };

        let changes = ChangeSet::diff(&self.old, &self.working);
        let saved = persistence::save(self.store.backend.as_ref(), &self.working);
        if let Err(e) = &saved {
            tracing::error!(error = %e, "Failed to persist settings");
        }
        *guard = self.working.clone();
        drop(guard);

        changes.log(&self.old, &self.working);
        dispatch::dispatch_changes(self.store.hooks.as_ref(), &self.old, &self.working, &changes);

        saved.map(|()| changes)
    }
}

impl Deref for ModifiableAccessor<'_> {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.working
    }
}

impl DerefMut for ModifiableAccessor<'_> {
    fn deref_mut(&mut self) -> &mut Fields {
        &mut self.working
    }
}

impl Drop for ModifiableAccessor<'_> {
    fn drop(&mut self) {
        // Errors were already logged by finish.
        let _ = self.finish();
    }
}

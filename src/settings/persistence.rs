//! Versioned persistence of `Fields`.
//!
//! # Blob layout
//! ```text
//! {
//!   "abi_version": 1,
//!   "auto_run": false,
//!   "rssi_min": -80,
//!   ...one entry per schema field
//! }
//! ```
//!
//! A blob without `abi_version`, or with a different one, is never partially
//! trusted: loading falls back to schema defaults. Within a trusted blob a
//! missing or malformed key falls back to that field's default.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::settings::error::{Result, SettingsError};
use crate::settings::fields::{Fields, Value, FIELDS, FIELDS_ABI_VERSION};

/// Reserved key holding the schema ABI version.
pub const ABI_VERSION_KEY: &str = "abi_version";

/// Persisted key-value blob.
pub type Blob = BTreeMap<String, serde_json::Value>;

/// Outcome of loading persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// The blob carries a version tag that does not match this build.
    AbiIncompatible,
    /// No usable blob, or a blob without a version tag.
    NoAbiField,
    Successful,
}

impl std::fmt::Display for LoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadResult::AbiIncompatible => write!(f, "abi incompatible"),
            LoadResult::NoAbiField => write!(f, "no abi field"),
            LoadResult::Successful => write!(f, "successful"),
        }
    }
}

/// Durable storage for one blob.
pub trait SettingsBackend: Send + Sync {
    /// Read the stored blob. `Ok(None)` means nothing has been stored yet.
    fn read(&self) -> Result<Option<Blob>>;

    /// Replace the stored blob as a single unit.
    fn write(&self, blob: &Blob) -> Result<()>;
}

/// Serialize every field plus the ABI version.
pub fn encode(fields: &Fields) -> Blob {
    let mut blob = Blob::new();
    blob.insert(ABI_VERSION_KEY.to_string(), serde_json::Value::from(FIELDS_ABI_VERSION));
    for desc in FIELDS {
        blob.insert(desc.name.to_string(), desc.value(fields).to_json());
    }
    blob
}

/// Classify a blob and rebuild `Fields` from it.
pub fn decode(blob: &Blob) -> (LoadResult, Fields) {
    let Some(version) = blob.get(ABI_VERSION_KEY) else {
        return (LoadResult::NoAbiField, Fields::default());
    };

    if version.as_u64() != Some(u64::from(FIELDS_ABI_VERSION)) {
        tracing::warn!(
            found = %version,
            expected = FIELDS_ABI_VERSION,
            "Persisted settings have an incompatible ABI version"
        );
        return (LoadResult::AbiIncompatible, Fields::default());
    }

    let mut fields = Fields::default();
    for desc in FIELDS {
        let Some(stored) = blob.get(desc.name) else {
            tracing::debug!(field = desc.name, "Field missing from blob, using default");
            continue;
        };
        match Value::from_json(desc.kind, stored) {
            Some(value) => {
                // Kind was checked by from_json.
                let _ = desc.assign(&mut fields, value);
            }
            None => {
                tracing::warn!(
                    field = desc.name,
                    expected = desc.kind.as_str(),
                    "Stored value has the wrong type, using default"
                );
            }
        }
    }

    (LoadResult::Successful, fields)
}

/// Read and classify the backend's blob.
pub fn load(backend: &dyn SettingsBackend) -> Result<(LoadResult, Fields)> {
    Ok(match backend.read()? {
        Some(blob) => decode(&blob),
        None => (LoadResult::NoAbiField, Fields::default()),
    })
}

/// Write every field plus the ABI version.
pub fn save(backend: &dyn SettingsBackend, fields: &Fields) -> Result<()> {
    backend.write(&encode(fields))
}

/// Stores the blob as a JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn storage_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsBackend for FileBackend {
    fn read(&self) -> Result<Option<Blob>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };

        match serde_json::from_str::<Blob>(&content) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Settings file is unreadable, ignoring it");
                Ok(Some(Blob::new()))
            }
        }
    }

    fn write(&self, blob: &Blob) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(blob)?;

        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| self.storage_error(e))?;

        // One temp file per write, synced before the rename. Dropped on error.
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.storage_error(e))?;
        temp.write_all(&bytes).map_err(|e| self.storage_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.storage_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.storage_error(e.error))?;

        tracing::trace!(path = ?self.path, "Settings written");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    blob: Mutex<Option<Blob>>,
    writes: AtomicUsize,
}

/// In-process backend. Clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing blob.
    pub fn with_blob(blob: Blob) -> Self {
        let backend = Self::default();
        *backend.lock() = Some(blob);
        backend
    }

    /// Current stored blob.
    pub fn blob(&self) -> Option<Blob> {
        self.lock().clone()
    }

    /// Number of completed writes.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Blob>> {
        self.inner.blob.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Blob>> {
        Ok(self.lock().clone())
    }

    fn write(&self, blob: &Blob) -> Result<()> {
        *self.lock() = Some(blob.clone());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::fields::TrayIconBatteryBehavior;
    use serde_json::json;

    fn sample() -> Fields {
        Fields {
            auto_run: true,
            skipped_version: "0.4.0".into(),
            rssi_min: -55,
            loud_volume_level: 12,
            device_address: 0x00_1A_7D_DA_71_13,
            tray_icon_battery: TrayIconBatteryBehavior::WhenLowBattery,
            ..Fields::default()
        }
    }

    #[test]
    fn test_encode_writes_every_field() {
        let blob = encode(&sample());
        assert_eq!(blob.len(), FIELDS.len() + 1);
        assert_eq!(blob[ABI_VERSION_KEY], json!(FIELDS_ABI_VERSION));
        assert_eq!(blob["device_address"], json!(0x00_1A_7D_DA_71_13u64));
        assert_eq!(blob["tray_icon_battery"], json!(1));
        assert_eq!(blob["loud_volume_level"], json!(12));
    }

    #[test]
    fn test_decode_classification() {
        let mut blob = encode(&sample());
        let (result, fields) = decode(&blob);
        assert_eq!(result, LoadResult::Successful);
        assert_eq!(fields, sample());

        blob.insert(ABI_VERSION_KEY.into(), json!(FIELDS_ABI_VERSION + 1));
        let (result, fields) = decode(&blob);
        assert_eq!(result, LoadResult::AbiIncompatible);
        assert_eq!(fields, Fields::default());

        blob.insert(ABI_VERSION_KEY.into(), json!("1"));
        assert_eq!(decode(&blob).0, LoadResult::AbiIncompatible);

        blob.remove(ABI_VERSION_KEY);
        let (result, fields) = decode(&blob);
        assert_eq!(result, LoadResult::NoAbiField);
        assert_eq!(fields, Fields::default());
    }

    #[test]
    fn test_decode_defaults_missing_and_invalid_keys() {
        let mut blob = Blob::new();
        blob.insert(ABI_VERSION_KEY.into(), json!(FIELDS_ABI_VERSION));
        blob.insert("auto_run".into(), json!(true));
        blob.insert("rssi_min".into(), json!("loud"));
        blob.insert("tray_icon_battery".into(), json!(9));
        blob.insert("no_longer_exists".into(), json!(1));

        let (result, fields) = decode(&blob);
        assert_eq!(result, LoadResult::Successful);
        assert!(fields.auto_run);
        assert_eq!(fields.rssi_min, -80);
        assert_eq!(fields.tray_icon_battery, TrayIconBatteryBehavior::Disable);
        assert!(fields.automatic_ear_detection);
    }

    #[test]
    fn test_memory_backend_shares_blob() {
        let backend = MemoryBackend::new();
        let view = backend.clone();
        assert_eq!(load(&backend).unwrap().0, LoadResult::NoAbiField);

        save(&backend, &sample()).unwrap();
        assert_eq!(view.writes(), 1);
        let (result, fields) = load(&view).unwrap();
        assert_eq!(result, LoadResult::Successful);
        assert_eq!(fields, sample());
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let backend = FileBackend::new(&path);

        assert!(backend.read().unwrap().is_none());

        save(&backend, &sample()).unwrap();
        assert!(path.exists());
        // No temp file left behind.
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);

        let (result, fields) = load(&backend).unwrap();
        assert_eq!(result, LoadResult::Successful);
        assert_eq!(fields, sample());
    }

    #[test]
    fn test_file_backend_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let backend = FileBackend::new(&path);
        let (result, fields) = load(&backend).unwrap();
        assert_eq!(result, LoadResult::NoAbiField);
        assert_eq!(fields, Fields::default());
    }

    #[test]
    fn test_file_backend_concurrent_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let backend = FileBackend::new(&path);
                std::thread::spawn(move || {
                    for n in 0..100 {
                        let fields = Fields {
                            rssi_min: -(i * 100 + n),
                            ..Fields::default()
                        };
                        save(&backend, &fields).unwrap();
                    }
                })
            })
            .collect();

        let reader = FileBackend::new(&path);
        for _ in 0..100 {
            if let Ok((result, _)) = load(&reader) {
                assert_ne!(result, LoadResult::AbiIncompatible);
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let (result, fields) = load(&reader).unwrap();
        assert_eq!(result, LoadResult::Successful);
        assert!(fields.rssi_min == -99 || fields.rssi_min == -199);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_backend_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let backend = FileBackend::new(blocker.join("settings.json"));
        let err = save(&backend, &Fields::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Storage { .. }));
    }
}

//! Persistent key-value preferences.
//!
//! The store is deliberately forgiving: anything that cannot be read back as the requested type is
//! reported through `log` and replaced by the caller-supplied default.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage medium behind [`PreferenceStore`].
pub trait PreferenceBackend {
    fn load_entry(&self, key: &str) -> Option<Value>;
    fn store_entry(&mut self, key: &str, value: Value) -> Result<()>;
    /// Removes all listed keys as one write.
    fn remove_entries(&mut self, keys: &[&str]) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self { entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load_entry(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn store_entry(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_entries(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// A single JSON object on disk, rewritten in full on every change.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileBackend {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    log::warn!("[prefs] {} is not a JSON object; starting empty.", path.display());
                    Map::new()
                }
                Err(err) => {
                    log::warn!("[prefs] Failed to parse {}: {err}. Starting empty.", path.display());
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                log::warn!("[prefs] Failed to read {}: {err}. Starting empty.", path.display());
                Map::new()
            }
        };
        Self { path, entries }
    }

    /// `<config dir>/hotspot_viewer/preferences.json`, when the platform exposes a config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "hotspot-viewer", "hotspot_viewer")
            .map(|dirs| dirs.config_dir().join("preferences.json"))
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&self.entries).context("Failed to encode preferences")?;
        fs::write(&self.path, bytes).with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load_entry(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn store_entry(&mut self, key: &str, value: Value) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(err) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_entries(&mut self, keys: &[&str]) -> Result<()> {
        let mut next = self.entries.clone();
        for key in keys {
            next.remove(*key);
        }
        let previous = std::mem::replace(&mut self.entries, next);
        if let Err(err) = self.flush() {
            self.entries = previous;
            return Err(err);
        }
        Ok(())
    }
}

/// Typed, fault-tolerant view over a [`PreferenceBackend`].
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
}

impl PreferenceStore {
    pub fn new(backend: impl PreferenceBackend + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.backend.load_entry(key) else {
            return default;
        };
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("[prefs] Ignoring malformed value for '{key}' ({raw}): {err}");
                default
            }
        }
    }

    /// Like [`get`](Self::get), but values rejected by `accept` also fall back to `default`.
    pub fn get_validated<T, F>(&self, key: &str, default: T, accept: F) -> T
    where
        T: DeserializeOwned + Clone + std::fmt::Debug,
        F: Fn(&T) -> bool,
    {
        let value = self.get(key, default.clone());
        if accept(&value) {
            value
        } else {
            log::warn!("[prefs] Value {value:?} for '{key}' is out of range; using default.");
            default
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.backend.load_entry(key).is_some()
    }

    /// Writes one entry. Failures are logged and returned so the caller can keep its own state in step.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let encoded =
            serde_json::to_value(value).with_context(|| format!("Failed to encode preference '{key}'"))?;
        self.backend.store_entry(key, encoded).map_err(|err| {
            log::error!("[prefs] Failed to persist '{key}': {err:?}");
            err
        })
    }

    pub fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        self.backend.remove_entries(keys).map_err(|err| {
            log::error!("[prefs] Failed to remove {keys:?}: {err:?}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_entries_fall_back_to_default() {
        let store = PreferenceStore::new(MemoryBackend::with_entries([
            ("speed", json!("fast")),
            ("enabled", json!(1)),
            ("ok", json!(2.5)),
        ]));
        assert_eq!(store.get("speed", 0.3_f32), 0.3);
        assert!(store.get("enabled", true));
        assert_eq!(store.get("ok", 1.0_f32), 2.5);
        assert_eq!(store.get("missing", 7_u32), 7);
    }

    #[test]
    fn validation_rejects_out_of_domain_values() {
        let store = PreferenceStore::new(MemoryBackend::with_entries([("scale", json!(-2.0))]));
        assert_eq!(store.get_validated("scale", 1.0_f32, |v| *v > 0.0), 1.0);
    }

    #[test]
    fn file_backend_survives_garbage_on_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, b"{not json").expect("write garbage");
        let mut store = PreferenceStore::new(JsonFileBackend::open(&path));
        assert_eq!(store.get("angle", 45.0_f32), 45.0);
        store.set("angle", &90.0_f32).expect("write angle");

        let reopened = PreferenceStore::new(JsonFileBackend::open(&path));
        assert_eq!(reopened.get("angle", 45.0_f32), 90.0);
    }
}

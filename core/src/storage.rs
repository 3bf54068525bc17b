//! Persistent key/value storage for the session token.
//!
//! # Design
//! `TokenStore` is the stand-in for browser-local storage: string keys,
//! string values, reads never fail. `FileTokenStore` keeps a single JSON
//! object on disk and re-reads it on every `get`, so two clients pointed at
//! the same file observe each other's logins and logouts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ApiError;

pub trait TokenStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&mut self, key: &str) -> Result<(), ApiError>;
}

/// In-process store. Nothing survives the value being dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file. A missing or corrupt file reads as empty.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), ApiError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        fs::write(&self.path, raw).map_err(|e| ApiError::Storage(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        let mut entries = self.load();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}

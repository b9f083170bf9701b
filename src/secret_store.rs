//! Persistent key/value store for API keys and provider settings.
//!
//! Values live in `~/.fact-or-opinion/secrets.json`. Lookups fall back to
//! the process environment, so `GOOGLE_API_KEY=... fact-or-opinion` works
//! without ever writing the file. Keys are written in sorted order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LLMError;

const STORE_DIR: &str = ".fact-or-opinion";
const STORE_FILE: &str = "secrets.json";

#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    secrets: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl SecretStore {
    /// Opens the store in the user's home directory. A missing file is an
    /// empty store.
    pub fn new() -> Result<Self, LLMError> {
        let home = dirs::home_dir()
            .ok_or_else(|| LLMError::Generic("Could not find home directory".to_string()))?;
        Self::open(home.join(STORE_DIR).join(STORE_FILE))
    }

    /// Opens a store backed by an explicit file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LLMError> {
        let path = path.into();
        let secrets = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| LLMError::Generic(format!("Failed to read secrets file: {e}")))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        log::debug!("loaded {} secrets from {}", secrets.len(), path.display());
        Ok(Self {
            secrets,
            path: Some(path),
        })
    }

    /// A store that only reads the environment and never touches disk.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Looks `key` up in the file first, then in the environment.
    pub fn get(&self, key: &str) -> Option<String> {
        self.secrets
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LLMError> {
        self.secrets.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Removes `key` from the file. Environment variables are unaffected.
    pub fn delete(&mut self, key: &str) -> Result<(), LLMError> {
        self.secrets.remove(key);
        self.save()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn save(&self) -> Result<(), LLMError> {
        let Some(path) = &self.path else {
            return Err(LLMError::Generic(
                "Secret store has no backing file".to_string(),
            ));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LLMError::Generic(format!("Failed to create directory: {e}")))?;
        }
        let content = serde_json::to_string_pretty(&self.secrets)?;
        fs::write(path, content)
            .map_err(|e| LLMError::Generic(format!("Failed to write secrets file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secrets.json");

        let mut store = SecretStore::open(&path).unwrap();
        assert_eq!(store.get("FOO_TEST_SECRET_STORE"), None);
        store.set("FOO_TEST_SECRET_STORE", "bar").unwrap();

        let reopened = SecretStore::open(&path).unwrap();
        assert_eq!(reopened.get("FOO_TEST_SECRET_STORE").as_deref(), Some("bar"));

        let mut reopened = reopened;
        reopened.delete("FOO_TEST_SECRET_STORE").unwrap();
        let again = SecretStore::open(&path).unwrap();
        assert_eq!(again.get("FOO_TEST_SECRET_STORE"), None);
    }

    #[test]
    fn file_keys_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let mut store = SecretStore::open(&path).unwrap();
        for key in ["OPENAI_MODEL", "GOOGLE_API_KEY", "OPENAI_BASE_URL", "GOOGLE_MODEL"] {
            store.set(key, "x").unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let sorted = ["GOOGLE_API_KEY", "GOOGLE_MODEL", "OPENAI_BASE_URL", "OPENAI_MODEL"];
        let positions: Vec<usize> = sorted
            .iter()
            .map(|key| content.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{content}");
    }

    #[test]
    fn env_only_store_cannot_save() {
        let mut store = SecretStore::from_env();
        assert!(store.set("A", "b").is_err());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            SecretStore::open(&path).unwrap_err(),
            LLMError::JsonError(_)
        ));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SecretStore::open(dir.path().join("s.json")).unwrap();
        store.set("EMPTY_TEST_SECRET_STORE", "").unwrap();
        assert_eq!(store.get("EMPTY_TEST_SECRET_STORE"), None);
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::DEFAULT_FORMAT;
use crate::store::{load_json, write_json};

pub const CONFIG_FILE: &str = "config.json";

/// A stored setting value. Anything that is not one of the known shapes is
/// kept verbatim in `Other` so newer keys survive a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    String(String),
    StringList(Vec<String>),
    Other(serde_json::Value),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            ConfigValue::Number(n) => write!(f, "{n}"),
            ConfigValue::String(s) => write!(f, "{s}"),
            ConfigValue::StringList(items) => write!(f, "{}", items.join(",")),
            ConfigValue::Other(v) => write!(f, "{v}"),
        }
    }
}

pub type ConfigDocument = BTreeMap<String, ConfigValue>;

fn default_document() -> ConfigDocument {
    let mut doc = ConfigDocument::new();
    doc.insert("format".to_string(), ConfigValue::String(DEFAULT_FORMAT.to_string()));
    doc
}

/// Key/value settings backed by `config.json`.
///
/// The store does no validation of its own; callers check keys and values
/// against the setting registry before calling [`ConfigStore::set`].
pub struct ConfigStore {
    path: PathBuf,
    values: ConfigDocument,
    load_error: Option<String>,
}

impl ConfigStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let (mut values, load_error) = load_json::<ConfigDocument>(&path).or_else(default_document);
        // absence means default, never an explicit null
        values.retain(|_, v| !matches!(v, ConfigValue::Other(serde_json::Value::Null)));
        Self {
            path,
            values,
            load_error,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Updates the value in memory, then persists. A failed write is returned
    /// to the caller but the in-memory value stays updated.
    pub fn set(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Removes `key` so lookups fall back to the registry default.
    /// Returns whether the key was set.
    pub fn reset(&mut self, key: &str) -> Result<bool> {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn get_all(&self) -> ConfigDocument {
        self.values.clone()
    }

    pub fn had_load_error(&self) -> bool {
        self.load_error.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn save(&self) -> Result<()> {
        write_json(&self.path, &self.values)
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("moneta")
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(format!("{}{rest}", home.to_string_lossy()));
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        assert!(!store.had_load_error());
        assert_eq!(store.get("format"), Some(&ConfigValue::String("table".to_string())));
        assert_eq!(store.get("cacheData"), None);
    }

    #[test]
    fn test_set_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        store.set("cacheData", ConfigValue::Bool(true)).unwrap();

        let reopened = ConfigStore::open(dir.path());
        assert_eq!(reopened.get("cacheData"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_reset_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path());
        store.set("cacheMaxAgeMinutes", ConfigValue::Number(5.0)).unwrap();
        assert!(store.reset("cacheMaxAgeMinutes").unwrap());
        assert!(!store.reset("cacheMaxAgeMinutes").unwrap());

        let reopened = ConfigStore::open(dir.path());
        assert_eq!(reopened.get("cacheMaxAgeMinutes"), None);
    }

    #[test]
    fn test_get_all_is_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut all = store.get_all();
        all.insert("format".to_string(), ConfigValue::String("json".to_string()));
        all.clear();
        assert_eq!(store.get("format").and_then(|v| v.as_str()), Some("table"));
    }

    #[test]
    fn test_corrupt_file_recovers_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{\"format\": ").unwrap();
        let store = ConfigStore::open(dir.path());
        assert!(store.had_load_error());
        assert!(store.load_error().unwrap().contains(CONFIG_FILE));
        assert_eq!(store.get_all(), default_document());
    }

    #[test]
    fn test_unknown_and_null_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"format": "json", "future": {"nested": 1}, "dropped": null, "accounts": ["a", "b"]}"#,
        )
        .unwrap();
        let mut store = ConfigStore::open(dir.path());
        assert_eq!(store.get("dropped"), None);
        assert_eq!(
            store.get("accounts"),
            Some(&ConfigValue::StringList(vec!["a".to_string(), "b".to_string()]))
        );
        assert!(matches!(store.get("future"), Some(ConfigValue::Other(_))));

        store.set("format", ConfigValue::String("table".to_string())).unwrap();
        let raw = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(raw.contains("\"nested\": 1"));
        assert!(!raw.contains("dropped"));
    }

    #[test]
    fn test_set_surfaces_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let mut store = ConfigStore::open(&blocker.join("moneta"));
        let err = store.set("cacheData", ConfigValue::Bool(true));
        assert!(err.is_err());
        assert_eq!(store.get("cacheData"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ConfigValue::Number(60.0).to_string(), "60");
        assert_eq!(ConfigValue::Number(1.5).to_string(), "1.5");
        assert_eq!(
            ConfigValue::StringList(vec!["acc_1".to_string(), "acc_2".to_string()]).to_string(),
            "acc_1,acc_2"
        );
    }
}

//! Known settings, their types and defaults.

use crate::error::{MonetaError, Result};
use crate::settings::{ConfigStore, ConfigValue};

pub const DEFAULT_FORMAT: &str = "table";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    String,
    Bool,
    Number,
    StringList,
}

impl SettingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::String => "string",
            SettingKind::Bool => "boolean",
            SettingKind::Number => "number",
            SettingKind::StringList => "list",
        }
    }
}

pub struct SettingDef {
    pub key: &'static str,
    pub kind: SettingKind,
    pub choices: Option<&'static [&'static str]>,
    /// Raw default, interpreted according to `kind`.
    pub default: &'static str,
    pub description: &'static str,
}

pub const SETTINGS: &[SettingDef] = &[
    SettingDef {
        key: "format",
        kind: SettingKind::String,
        choices: Some(&["table", "json"]),
        default: DEFAULT_FORMAT,
        description: "Output format for listings",
    },
    SettingDef {
        key: "cacheData",
        kind: SettingKind::Bool,
        choices: None,
        default: "false",
        description: "Write freshly loaded accounts and transactions to the local cache",
    },
    SettingDef {
        key: "cacheMaxAgeMinutes",
        kind: SettingKind::Number,
        choices: None,
        default: "60",
        description: "Minutes after which cached data is reported as stale",
    },
    SettingDef {
        key: "defaultAccounts",
        kind: SettingKind::StringList,
        choices: None,
        default: "",
        description: "Account ids to list when no --account is given",
    },
];

impl SettingDef {
    pub fn default_value(&self) -> ConfigValue {
        match self.kind {
            SettingKind::String => ConfigValue::String(self.default.to_string()),
            SettingKind::Bool => ConfigValue::Bool(self.default == "true"),
            SettingKind::Number => ConfigValue::Number(self.default.parse().unwrap_or_default()),
            SettingKind::StringList => ConfigValue::StringList(split_list(self.default)),
        }
    }

    /// Parses user input into a value of this setting's type.
    pub fn parse(&self, raw: &str) -> Result<ConfigValue> {
        let raw = raw.trim();
        let value = match self.kind {
            SettingKind::String => ConfigValue::String(raw.to_string()),
            SettingKind::Bool => match raw.to_lowercase().as_str() {
                "true" | "yes" | "1" => ConfigValue::Bool(true),
                "false" | "no" | "0" => ConfigValue::Bool(false),
                _ => {
                    return Err(MonetaError::Validation(format!(
                        "{} expects true or false, got '{raw}'",
                        self.key
                    )))
                }
            },
            SettingKind::Number => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => ConfigValue::Number(n),
                _ => {
                    return Err(MonetaError::Validation(format!(
                        "{} expects a number, got '{raw}'",
                        self.key
                    )))
                }
            },
            SettingKind::StringList => ConfigValue::StringList(split_list(raw)),
        };
        if let (Some(choices), ConfigValue::String(s)) = (self.choices, &value) {
            if !choices.contains(&s.as_str()) {
                return Err(MonetaError::Validation(format!(
                    "{} must be one of: {}",
                    self.key,
                    choices.join(", ")
                )));
            }
        }
        Ok(value)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn lookup(key: &str) -> Option<&'static SettingDef> {
    SETTINGS.iter().find(|def| def.key == key)
}

pub fn parse(key: &str, raw: &str) -> Result<ConfigValue> {
    lookup(key)
        .ok_or_else(|| MonetaError::UnknownSetting(key.to_string()))?
        .parse(raw)
}

/// Stored value for `key`, or the registry default when unset.
pub fn effective(store: &ConfigStore, key: &str) -> Option<ConfigValue> {
    store
        .get(key)
        .cloned()
        .or_else(|| lookup(key).map(SettingDef::default_value))
}

fn typed<T>(store: &ConfigStore, key: &str, get: impl Fn(&ConfigValue) -> Option<T>) -> Option<T> {
    // a stored value of the wrong type falls back to the default
    store
        .get(key)
        .and_then(&get)
        .or_else(|| lookup(key).and_then(|def| get(&def.default_value())))
}

pub fn output_format(store: &ConfigStore) -> String {
    typed(store, "format", |v| v.as_str().map(String::from))
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
}

pub fn cache_enabled(store: &ConfigStore) -> bool {
    typed(store, "cacheData", ConfigValue::as_bool).unwrap_or(false)
}

pub fn cache_max_age(store: &ConfigStore) -> chrono::Duration {
    let minutes = typed(store, "cacheMaxAgeMinutes", ConfigValue::as_f64).unwrap_or(60.0);
    // float-to-int casts saturate; chrono rejects anything past its own range
    chrono::Duration::try_seconds((minutes.max(0.0) * 60.0) as i64).unwrap_or(chrono::Duration::MAX)
}

pub fn default_accounts(store: &ConfigStore) -> Vec<String> {
    typed(store, "defaultAccounts", |v| v.as_list().map(<[String]>::to_vec)).unwrap_or_default()
}

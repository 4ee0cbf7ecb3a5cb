use comfy_table::{Cell, Table};
use serde_json::json;

use crate::cli::output::{print_json, warn, OutputFormat};
use crate::error::{MonetaError, Result};
use crate::registry::{self, SETTINGS};
use crate::settings::ConfigStore;

pub fn list(config: &ConfigStore) -> Result<()> {
    let stored = config.get_all();

    if OutputFormat::from_config(config) == OutputFormat::Json {
        let mut effective = serde_json::Map::new();
        for def in SETTINGS {
            if let Some(value) = registry::effective(config, def.key) {
                effective.insert(def.key.to_string(), serde_json::to_value(value)?);
            }
        }
        for (key, value) in &stored {
            if registry::lookup(key).is_none() {
                effective.insert(key.clone(), serde_json::to_value(value)?);
            }
        }
        return print_json(&effective);
    }

    let mut table = Table::new();
    table.set_header(vec!["Key", "Value", "Type", "Default", "Description"]);
    for def in SETTINGS {
        let value = registry::effective(config, def.key)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let marker = if stored.contains_key(def.key) { "" } else { " (default)" };
        table.add_row(vec![
            Cell::new(def.key),
            Cell::new(format!("{value}{marker}")),
            Cell::new(def.kind.as_str()),
            Cell::new(def.default_value()),
            Cell::new(def.description),
        ]);
    }
    for (key, value) in &stored {
        if registry::lookup(key).is_none() {
            table.add_row(vec![
                Cell::new(key),
                Cell::new(value),
                Cell::new("unknown"),
                Cell::new(""),
                Cell::new(""),
            ]);
        }
    }
    println!("Settings\n{table}");
    Ok(())
}

pub fn get(config: &ConfigStore, key: &str) -> Result<()> {
    let value = registry::effective(config, key)
        .ok_or_else(|| MonetaError::UnknownSetting(key.to_string()))?;
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(&json!({ key: value }));
    }
    println!("{value}");
    Ok(())
}

pub fn set(config: &mut ConfigStore, key: &str, raw: &str) -> Result<()> {
    let value = registry::parse(key, raw)?;
    if config.had_load_error() {
        warn("the existing config file could not be read and will be replaced");
    }
    config.set(key, value.clone())?;
    println!("Set {key} = {value}");
    Ok(())
}

pub fn reset(config: &mut ConfigStore, key: &str) -> Result<()> {
    let def = registry::lookup(key);
    if def.is_none() && config.get(key).is_none() {
        return Err(MonetaError::UnknownSetting(key.to_string()));
    }
    config.reset(key)?;
    match def {
        Some(def) => println!("Reset {key} to default ({})", def.default_value()),
        None => println!("Removed {key}"),
    }
    Ok(())
}

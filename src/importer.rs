//! Reads account and transaction records exported from the banking API.
//!
//! Accepts either a bare JSON array or the API's response envelope
//! (`{"items": [...]}`).

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{MonetaError, Result};
use crate::models::{Account, Transaction};

pub fn parse_records<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    let invalid = |msg: String| MonetaError::Validation(format!("Invalid export: {msg}"));

    let value: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let items = match value {
        Value::Array(records) => Value::Array(records),
        Value::Object(mut envelope) => envelope
            .remove("items")
            .filter(Value::is_array)
            .ok_or_else(|| invalid("expected an \"items\" array".to_string()))?,
        _ => return Err(invalid("expected an array of records".to_string())),
    };
    serde_json::from_value(items).map_err(|e| invalid(e.to_string()))
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    read_records(path)
}

pub fn read_accounts(path: &Path) -> Result<Vec<Account>> {
    read_records(path)
}

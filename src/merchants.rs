use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MonetaError, Result};
use crate::models::Transaction;
use crate::store::{load_json, write_json};

pub const MERCHANTS_FILE: &str = "merchants.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantCategory {
    pub parent: String,
    pub category: String,
}

impl MerchantCategory {
    pub fn new(parent: &str, category: &str) -> Result<Self> {
        let (parent, category) = (parent.trim(), category.trim());
        if parent.is_empty() || category.is_empty() {
            return Err(MonetaError::Validation(
                "Both a parent category and a category are required".to_string(),
            ));
        }
        Ok(Self {
            parent: parent.to_string(),
            category: category.to_string(),
        })
    }
}

pub type MerchantMap = BTreeMap<String, MerchantCategory>;

pub fn normalize_key(merchant: &str) -> String {
    merchant.trim().to_lowercase()
}

/// User overrides assigning categories to merchants, backed by
/// `merchants.json`. Merging lives with the caller; the store only ever
/// replaces what it is given.
pub struct MerchantStore {
    path: PathBuf,
    mappings: MerchantMap,
    load_error: Option<String>,
}

impl MerchantStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(MERCHANTS_FILE);
        let (loaded, load_error) = load_json::<MerchantMap>(&path).or_else(MerchantMap::new);
        let mut mappings = MerchantMap::new();
        for (merchant, entry) in loaded {
            let key = normalize_key(&merchant);
            match MerchantCategory::new(&entry.parent, &entry.category) {
                Ok(category) if !key.is_empty() => {
                    mappings.insert(key, category);
                }
                _ => log::warn!("Dropping invalid merchant mapping '{merchant}' from {}", path.display()),
            }
        }
        Self {
            path,
            mappings,
            load_error,
        }
    }

    pub fn get_all_mappings(&self) -> &MerchantMap {
        &self.mappings
    }

    pub fn get_mapping(&self, merchant: &str) -> Option<&MerchantCategory> {
        self.mappings.get(&normalize_key(merchant))
    }

    pub fn has_merchant_mapping(&self, merchant: &str) -> bool {
        self.mappings.contains_key(&normalize_key(merchant))
    }

    pub fn upsert_merchant_category(&mut self, merchant: &str, category: MerchantCategory) -> Result<()> {
        let key = normalize_key(merchant);
        if key.is_empty() {
            return Err(MonetaError::Validation("Merchant name cannot be empty".to_string()));
        }
        self.mappings.insert(key, category);
        self.save()
    }

    pub fn remove_mapping(&mut self, merchant: &str) -> Result<bool> {
        if self.mappings.remove(&normalize_key(merchant)).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn replace_all(&mut self, mappings: MerchantMap) -> Result<()> {
        self.mappings = mappings;
        self.save()
    }

    pub fn clear_all_mappings(&mut self) -> Result<()> {
        self.replace_all(MerchantMap::new())
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn save(&self) -> Result<()> {
        write_json(&self.path, &self.mappings)
    }
}

/// Parses an exported mapping document, rejecting anything that is not an
/// object of `{parent, category}` objects.
pub fn parse_import(content: &str) -> Result<MerchantMap> {
    let invalid = |msg: String| MonetaError::Validation(format!("Invalid import file: {msg}"));

    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let entries = value
        .as_object()
        .ok_or_else(|| invalid("expected an object of merchant mappings".to_string()))?;

    let mut map = MerchantMap::new();
    for (merchant, entry) in entries {
        let field = |name: &str| entry.get(name).and_then(|v| v.as_str()).unwrap_or_default();
        let category = MerchantCategory::new(field("parent"), field("category"))
            .map_err(|_| invalid(format!("'{merchant}' needs non-empty parent and category strings")))?;
        let key = normalize_key(merchant);
        if key.is_empty() {
            return Err(invalid("merchant names cannot be empty".to_string()));
        }
        map.insert(key, category);
    }
    Ok(map)
}

/// With `merge`, imported keys overwrite or extend `existing`; without it the
/// import replaces everything.
pub fn merge_mappings(existing: &MerchantMap, imported: MerchantMap, merge: bool) -> MerchantMap {
    if !merge {
        return imported;
    }
    let mut merged = existing.clone();
    merged.extend(imported);
    merged
}

/// Overrides the category of every transaction whose merchant has a mapping.
/// Returns how many transactions were recategorized.
pub fn apply_mappings(mappings: &MerchantMap, transactions: &mut [Transaction]) -> usize {
    if mappings.is_empty() {
        return 0;
    }
    let mut applied = 0;
    for transaction in transactions.iter_mut() {
        let Some(merchant) = transaction.merchant.as_deref() else {
            continue;
        };
        if let Some(mapping) = mappings.get(&normalize_key(merchant)) {
            transaction.parent_category = Some(mapping.parent.clone());
            transaction.category = Some(mapping.category.clone());
            applied += 1;
        }
    }
    applied
}

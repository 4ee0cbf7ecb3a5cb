use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MonetaError, Result};
use crate::filter::TransactionFilter;
use crate::store::{load_json, write_json};

pub const QUERIES_FILE: &str = "queries.json";
pub const MAX_QUERY_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub filters: TransactionFilter,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn invalid(msg: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(msg.into()),
        }
    }

    fn into_result(self) -> Result<()> {
        match self.error {
            Some(msg) if !self.valid => Err(MonetaError::Validation(msg)),
            _ => Ok(()),
        }
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid query name pattern"))
}

pub fn validate_query_name(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return ValidationResult::invalid("Query name cannot be empty");
    }
    if name.chars().count() > MAX_QUERY_NAME_LEN {
        return ValidationResult::invalid(format!(
            "Query name must be at most {MAX_QUERY_NAME_LEN} characters"
        ));
    }
    if !name_pattern().is_match(name) {
        return ValidationResult::invalid(
            "Query name may only contain letters, numbers, hyphens and underscores",
        );
    }
    ValidationResult::ok()
}

/// Checks that a filter is worth saving.
pub fn validate_filter(filter: &TransactionFilter) -> Result<()> {
    let invalid = |msg: &str| Err(MonetaError::Validation(msg.to_string()));

    if filter.is_empty() {
        return invalid("A saved query needs at least one filter");
    }
    if filter.merchant.as_deref().is_some_and(|m| m.split(',').all(|t| t.trim().is_empty())) {
        return invalid("Merchant filter cannot be empty");
    }
    for amount in [filter.min_amount, filter.max_amount].into_iter().flatten() {
        if !amount.is_finite() || amount < 0.0 {
            return invalid("Amount bounds must be non-negative numbers");
        }
    }
    if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount) {
        if min > max {
            return invalid("Minimum amount cannot be greater than maximum amount");
        }
    }
    if let (Some(since), Some(until)) = (filter.since, filter.until) {
        if since > until {
            return invalid("Start date cannot be after end date");
        }
    }
    Ok(())
}

/// Named filters backed by `queries.json`.
///
/// The file maps each name to its query; the embedded `name` always equals
/// the key.
pub struct QueryStore {
    path: PathBuf,
    queries: BTreeMap<String, SavedQuery>,
    load_error: Option<String>,
}

impl QueryStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(QUERIES_FILE);
        let (mut queries, load_error) =
            load_json::<BTreeMap<String, SavedQuery>>(&path).or_else(BTreeMap::new);
        for (key, query) in queries.iter_mut() {
            if query.name != *key {
                log::warn!("Query '{}' stored under '{key}'; using the key", query.name);
                query.name = key.clone();
            }
        }
        Self {
            path,
            queries,
            load_error,
        }
    }

    pub fn save(
        &mut self,
        name: &str,
        filters: TransactionFilter,
        description: Option<String>,
    ) -> Result<SavedQuery> {
        validate_query_name(name).into_result()?;
        if self.exists(name) {
            return Err(MonetaError::Duplicate(name.to_string()));
        }
        validate_filter(&filters)?;

        let query = SavedQuery {
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            filters,
            created_at: Utc::now(),
            last_used: None,
        };
        self.queries.insert(name.to_string(), query.clone());
        self.persist()?;
        Ok(query)
    }

    pub fn get(&self, name: &str) -> Option<&SavedQuery> {
        self.queries.get(name)
    }

    /// Most recently created first.
    pub fn list(&self) -> Vec<&SavedQuery> {
        let mut list: Vec<&SavedQuery> = self.queries.values().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn delete(&mut self, name: &str) -> Result<bool> {
        if self.queries.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn mark_used(&mut self, name: &str) -> Result<()> {
        let Some(query) = self.queries.get_mut(name) else {
            return Ok(());
        };
        query.last_used = Some(Utc::now());
        self.persist()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Moves `old_name` to `new_name`. Returns false, changing nothing, if
    /// `old_name` is missing or `new_name` is taken.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<bool> {
        validate_query_name(new_name).into_result()?;
        if self.exists(new_name) {
            return Ok(false);
        }
        let Some(mut query) = self.queries.remove(old_name) else {
            return Ok(false);
        };
        query.name = new_name.to_string();
        self.queries.insert(new_name.to_string(), query);
        self.persist()?;
        Ok(true)
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn persist(&self) -> Result<()> {
        write_json(&self.path, &self.queries)
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::filter::Direction;

    fn merchant_filter(merchant: &str) -> TransactionFilter {
        TransactionFilter {
            merchant: Some(merchant.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["groceries", "Fuel_2025", "a", "with-dash", "x".repeat(64).as_str()] {
            let result = validate_query_name(name);
            assert!(result.valid, "{name} should be valid");
            assert!(result.error.is_none());
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "   ", "has space", "semi;colon", "ümlaut", "dot.name", "x".repeat(65).as_str()] {
            let result = validate_query_name(name);
            assert!(!result.valid, "{name:?} should be invalid");
            assert!(!result.error.unwrap().is_empty());
        }
    }

    #[test]
    fn test_save_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        let filters = TransactionFilter {
            merchant: Some("Countdown,Pak N Save".to_string()),
            direction: Some(Direction::Out),
            since: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        store
            .save("groceries", filters.clone(), Some("Supermarket runs".to_string()))
            .unwrap();

        let reopened = QueryStore::open(dir.path());
        let query = reopened.get("groceries").unwrap();
        assert_eq!(query.name, "groceries");
        assert_eq!(query.filters, filters);
        assert_eq!(query.description.as_deref(), Some("Supermarket runs"));
        assert!(query.last_used.is_none());
    }

    #[test]
    fn test_save_rejects_bad_input_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());

        let err = store.save("bad name", merchant_filter("x"), None).unwrap_err();
        assert!(matches!(err, MonetaError::Validation(_)));

        let err = store.save("empty", TransactionFilter::default(), None).unwrap_err();
        assert!(err.to_string().contains("at least one filter"), "got: {err}");

        let inverted = TransactionFilter {
            min_amount: Some(50.0),
            max_amount: Some(10.0),
            ..Default::default()
        };
        assert!(store.save("inverted", inverted, None).is_err());

        assert!(store.list().is_empty());
        assert!(!dir.path().join(QUERIES_FILE).exists());
    }

    #[test]
    fn test_save_duplicate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.save("fuel", merchant_filter("Z Energy"), None).unwrap();
        let err = store.save("fuel", merchant_filter("BP"), None).unwrap_err();
        assert!(matches!(err, MonetaError::Duplicate(_)));
        assert_eq!(store.get("fuel").unwrap().filters.merchant.as_deref(), Some("Z Energy"));
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.save("older", merchant_filter("a"), None).unwrap();
        sleep(Duration::from_millis(5));
        store.save("newer", merchant_filter("b"), None).unwrap();
        let names: Vec<&str> = store.list().iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
    }

    #[test]
    fn test_delete_twice() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.save("fuel", merchant_filter("Z Energy"), None).unwrap();
        assert!(store.delete("fuel").unwrap());
        assert!(!store.exists("fuel"));
        assert!(!store.delete("fuel").unwrap());
        assert!(!store.exists("fuel"));
        assert!(!QueryStore::open(dir.path()).exists("fuel"));
    }

    #[test]
    fn test_mark_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.mark_used("missing").unwrap();
        store.save("fuel", merchant_filter("Z Energy"), None).unwrap();
        store.mark_used("fuel").unwrap();
        let reopened = QueryStore::open(dir.path());
        assert!(reopened.get("fuel").unwrap().last_used.is_some());
    }

    #[test]
    fn test_rename_onto_existing_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.save("a", merchant_filter("one"), None).unwrap();
        store.save("b", merchant_filter("two"), None).unwrap();
        assert!(!store.rename("a", "b").unwrap());
        assert_eq!(store.get("a").unwrap().filters.merchant.as_deref(), Some("one"));
        assert_eq!(store.get("b").unwrap().filters.merchant.as_deref(), Some("two"));
        assert!(!store.rename("missing", "c").unwrap());
        assert!(store.rename("a", "bad name").is_err());
        assert!(store.exists("a"));
    }

    #[test]
    fn test_groceries_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = QueryStore::open(dir.path());
        store.save("fuel", merchant_filter("Z Energy"), None).unwrap();
        sleep(Duration::from_millis(5));
        store
            .save("groceries", merchant_filter("Countdown,Pak N Save"), None)
            .unwrap();
        assert_eq!(store.list()[0].name, "groceries");

        store.mark_used("groceries").unwrap();
        assert!(store.get("groceries").unwrap().last_used.is_some());

        assert!(store.rename("groceries", "food").unwrap());
        assert!(store.get("groceries").is_none());
        let food = store.get("food").unwrap();
        assert_eq!(food.name, "food");
        assert!(food.last_used.is_some());

        let reopened = QueryStore::open(dir.path());
        assert!(reopened.get("groceries").is_none());
        assert_eq!(reopened.get("food").unwrap().name, "food");
    }

    #[test]
    fn test_write_failures_are_returned() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("moneta");
        let mut store = QueryStore::open(&home);
        store.save("fuel", merchant_filter("BP"), None).unwrap();
        store.save("groceries", merchant_filter("Countdown"), None).unwrap();

        std::fs::remove_dir_all(&home).unwrap();
        std::fs::write(&home, "blocker").unwrap();

        assert!(store.save("coffee", merchant_filter("Best Ugly"), None).is_err());
        assert!(store.mark_used("fuel").is_err());
        assert!(store.rename("fuel", "petrol").is_err());
        assert!(store.delete("groceries").is_err());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(QUERIES_FILE), "[1, 2").unwrap();
        let store = QueryStore::open(dir.path());
        assert!(store.list().is_empty());
        assert!(store.load_error().is_some());
    }

    #[test]
    fn test_mismatched_name_uses_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(QUERIES_FILE),
            r#"{"fuel": {"name": "petrol", "filters": {"merchant": "BP"}, "createdAt": "2025-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        let store = QueryStore::open(dir.path());
        assert_eq!(store.get("fuel").unwrap().name, "fuel");
    }
}

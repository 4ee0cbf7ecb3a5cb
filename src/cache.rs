//! Best-effort snapshot of the last fetched accounts and transactions.
//!
//! Unlike the config and query stores, a failed write here never aborts the
//! command: the in-memory cache keeps the new data and the failure is kept in
//! [`CacheStore::last_write_error`] for the caller to report.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Account, Transaction};
use crate::store::{load_json, write_json};

pub const CACHE_FILE: &str = "cache.json";

/// Either fully populated (timestamp and items) or fully absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct CacheEntry<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<T>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            last_update: None,
            items: Vec::new(),
        }
    }
}

impl<T> CacheEntry<T> {
    fn populated(items: Vec<T>, now: DateTime<Utc>) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        Self {
            last_update: Some(now),
            items,
        }
    }

    fn normalized(self) -> Self {
        match self.last_update {
            Some(_) if !self.items.is_empty() => self,
            _ => Self::default(),
        }
    }

    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.last_update.is_some_and(|at| now - at <= max_age)
    }

    fn info(&self) -> EntryInfo {
        EntryInfo {
            count: self.items.len(),
            last_update: self.last_update,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    transactions: CacheEntry<Transaction>,
    #[serde(default)]
    accounts: CacheEntry<Account>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub count: usize,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub transactions: EntryInfo,
    pub accounts: EntryInfo,
}

pub struct CacheStore {
    path: PathBuf,
    doc: CacheDocument,
    load_error: Option<String>,
    last_write_error: Option<String>,
}

impl CacheStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(CACHE_FILE);
        let (doc, load_error) = load_json::<CacheDocument>(&path).or_else(CacheDocument::default);
        let doc = CacheDocument {
            transactions: doc.transactions.normalized(),
            accounts: doc.accounts.normalized(),
        };
        Self {
            path,
            doc,
            load_error,
            last_write_error: None,
        }
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            transactions: self.doc.transactions.info(),
            accounts: self.doc.accounts.info(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.doc.transactions.items
    }

    pub fn accounts(&self) -> &[Account] {
        &self.doc.accounts.items
    }

    pub fn transaction_entry(&self) -> &CacheEntry<Transaction> {
        &self.doc.transactions
    }

    pub fn account_entry(&self) -> &CacheEntry<Account> {
        &self.doc.accounts
    }

    pub fn set_transactions(&mut self, items: Vec<Transaction>) {
        self.doc.transactions = CacheEntry::populated(items, Utc::now());
        self.persist();
    }

    pub fn set_accounts(&mut self, items: Vec<Account>) {
        self.doc.accounts = CacheEntry::populated(items, Utc::now());
        self.persist();
    }

    pub fn clear_cache(&mut self) {
        self.doc = CacheDocument::default();
        self.persist();
    }

    pub fn clear_account_cache(&mut self) {
        self.doc.accounts = CacheEntry::default();
        self.persist();
    }

    pub fn clear_transaction_cache(&mut self) {
        self.doc.transactions = CacheEntry::default();
        self.persist();
    }

    /// Failure message of the most recent write, cleared by the next
    /// successful one.
    pub fn last_write_error(&self) -> Option<&str> {
        self.last_write_error.as_deref()
    }

    pub fn load_error_message(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn persist(&mut self) {
        match write_json(&self.path, &self.doc) {
            Ok(()) => self.last_write_error = None,
            Err(e) => {
                log::warn!("Failed to write cache {}: {e}", self.path.display());
                self.last_write_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: &str, amount: f64) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "date": "2025-02-01",
            "amount": amount,
            "accountId": "acc_1"
        }))
        .unwrap()
    }

    fn account(id: &str) -> Account {
        serde_json::from_value(serde_json::json!({"id": id, "name": "Everyday"})).unwrap()
    }

    #[test]
    fn test_empty_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let info = store.cache_info();
        assert_eq!(info.transactions.count, 0);
        assert!(info.transactions.last_update.is_none());
        assert!(store.load_error_message().is_none());
    }

    #[test]
    fn test_set_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CacheStore::open(dir.path());
        store.set_transactions(vec![txn("t1", -5.0), txn("t2", 7.0)]);
        store.set_accounts(vec![account("acc_1")]);
        assert!(store.last_write_error().is_none());

        let reopened = CacheStore::open(dir.path());
        let info = reopened.cache_info();
        assert_eq!(info.transactions.count, 2);
        assert_eq!(info.accounts.count, 1);
        assert!(info.transactions.last_update.is_some());
        assert_eq!(reopened.transactions()[1].id, "t2");
    }

    #[test]
    fn test_clear_variants() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CacheStore::open(dir.path());
        store.set_transactions(vec![txn("t1", -5.0)]);
        store.set_accounts(vec![account("acc_1")]);

        store.clear_account_cache();
        assert_eq!(store.cache_info().accounts.count, 0);
        assert_eq!(store.cache_info().transactions.count, 1);

        store.clear_transaction_cache();
        assert!(store.transactions().is_empty());

        store.set_accounts(vec![account("acc_1")]);
        store.clear_cache();
        let info = CacheStore::open(dir.path()).cache_info();
        assert_eq!(info.transactions, EntryInfo { count: 0, last_update: None });
        assert_eq!(info.accounts, EntryInfo { count: 0, last_update: None });
    }

    #[test]
    fn test_empty_items_leave_entry_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CacheStore::open(dir.path());
        store.set_transactions(Vec::new());
        assert!(store.cache_info().transactions.last_update.is_none());
    }

    #[test]
    fn test_partial_entry_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CACHE_FILE),
            r#"{"transactions": {"items": [{"id": "t1", "date": "2025-01-01", "amount": 1}]},
                "accounts": {"lastUpdate": "2025-01-01T00:00:00Z", "items": []}}"#,
        )
        .unwrap();
        let store = CacheStore::open(dir.path());
        let info = store.cache_info();
        assert_eq!(info.transactions.count, 0);
        assert!(info.accounts.last_update.is_none());
    }

    #[test]
    fn test_hand_written_file_without_items() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CACHE_FILE),
            r#"{"transactions": {"lastUpdate": "2025-01-01T00:00:00Z"},
                "accounts": {"lastUpdate": "2025-01-01T00:00:00Z",
                             "items": [{"id": "acc_1", "name": "Everyday"}]}}"#,
        )
        .unwrap();
        let store = CacheStore::open(dir.path());
        assert!(store.load_error_message().is_none());
        assert!(store.cache_info().transactions.last_update.is_none());
        assert_eq!(store.accounts()[0].id, "acc_1");
    }

    #[test]
    fn test_corrupt_file_recovers_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "garbage").unwrap();
        let store = CacheStore::open(dir.path());
        assert!(store.load_error_message().unwrap().contains(CACHE_FILE));
        assert_eq!(store.cache_info().transactions.count, 0);
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let mut store = CacheStore::open(&blocker.join("moneta"));

        store.set_transactions(vec![txn("t1", -5.0)]);
        assert_eq!(store.transactions().len(), 1);
        assert!(store.last_write_error().is_some());

        store.clear_cache();
        assert!(store.transactions().is_empty());
        assert!(store.last_write_error().is_some());
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        let entry = CacheEntry::populated(vec![1, 2], now - Duration::minutes(30));
        assert!(entry.is_fresh(Duration::minutes(60), now));
        assert!(!entry.is_fresh(Duration::minutes(10), now));
        assert!(!CacheEntry::<i32>::default().is_fresh(Duration::minutes(60), now));
    }
}

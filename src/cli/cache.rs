use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cache::{CacheStore, EntryInfo};
use crate::cli::output::{print_json, report_cache_write_error, OutputFormat};
use crate::error::{MonetaError, Result};
use crate::fmt::{age, timestamp};
use crate::importer;
use crate::registry;
use crate::settings::ConfigStore;

fn status(entry: &EntryInfo, config: &ConfigStore) -> String {
    match entry.last_update {
        None => "empty".dimmed().to_string(),
        Some(at) => {
            let now = Utc::now();
            let label = format!("{} ago", age(at, now));
            if now - at <= registry::cache_max_age(config) {
                format!("fresh, {label}").green().to_string()
            } else {
                format!("stale, {label}").yellow().to_string()
            }
        }
    }
}

pub fn info(cache: &CacheStore, config: &ConfigStore) -> Result<()> {
    let info = cache.cache_info();
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(&info);
    }

    let mut table = Table::new();
    table.set_header(vec!["Collection", "Items", "Last updated", "Status"]);
    for (name, entry) in [("transactions", &info.transactions), ("accounts", &info.accounts)] {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(entry.count),
            Cell::new(timestamp(entry.last_update)),
            Cell::new(status(entry, config)),
        ]);
    }
    println!("Cache\n{table}");
    if !registry::cache_enabled(config) {
        println!("Automatic caching is off; enable it with `moneta config set cacheData true`.");
    }
    Ok(())
}

pub fn import(cache: &mut CacheStore, transactions: Option<PathBuf>, accounts: Option<PathBuf>) -> Result<()> {
    if transactions.is_none() && accounts.is_none() {
        return Err(MonetaError::Validation(
            "Nothing to import: pass --transactions and/or --accounts".into(),
        ));
    }
    if let Some(path) = transactions {
        let items = importer::read_transactions(&path)?;
        let count = items.len();
        cache.set_transactions(items);
        report_cache_write_error(cache.last_write_error());
        println!("Cached {count} transactions from {}", path.display());
    }
    if let Some(path) = accounts {
        let items = importer::read_accounts(&path)?;
        let count = items.len();
        cache.set_accounts(items);
        report_cache_write_error(cache.last_write_error());
        println!("Cached {count} accounts from {}", path.display());
    }
    Ok(())
}

pub fn clear(cache: &mut CacheStore, accounts: bool, transactions: bool) -> Result<()> {
    match (accounts, transactions) {
        (true, false) => {
            cache.clear_account_cache();
            report_cache_write_error(cache.last_write_error());
            println!("Cleared cached accounts");
        }
        (false, true) => {
            cache.clear_transaction_cache();
            report_cache_write_error(cache.last_write_error());
            println!("Cleared cached transactions");
        }
        _ => {
            cache.clear_cache();
            report_cache_write_error(cache.last_write_error());
            println!("Cleared cache");
        }
    }
    Ok(())
}

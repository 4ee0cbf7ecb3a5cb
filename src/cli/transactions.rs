use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cache::CacheStore;
use crate::cli::output::{
    print_json, print_transactions, report_cache_write_error, warn, OutputFormat,
};
use crate::cli::{FilterArgs, SourceArgs};
use crate::error::Result;
use crate::filter::filter_transactions;
use crate::fmt::{age, money};
use crate::importer;
use crate::merchants::{apply_mappings, MerchantStore};
use crate::models::{Account, Transaction};
use crate::registry;
use crate::reports::spending_by_category;
use crate::settings::ConfigStore;

/// Transactions from an export file (cached when `cacheData` is on) or from
/// the cache, with merchant overrides applied.
pub fn load_transactions(
    config: &ConfigStore,
    cache: &mut CacheStore,
    merchants: &MerchantStore,
    from_file: Option<&Path>,
) -> Result<Vec<Transaction>> {
    let mut transactions = match from_file {
        Some(path) => {
            let fresh = importer::read_transactions(path)?;
            if registry::cache_enabled(config) {
                cache.set_transactions(fresh.clone());
                report_cache_write_error(cache.last_write_error());
            }
            fresh
        }
        None => {
            let entry = cache.transaction_entry();
            match entry.last_update {
                None => warn(
                    "no cached transactions; run `moneta cache import --transactions <file>` or pass --from-file",
                ),
                Some(at) if !entry.is_fresh(registry::cache_max_age(config), Utc::now()) => {
                    warn(&format!("cached transactions are {} old", age(at, Utc::now())))
                }
                Some(_) => {}
            }
            cache.transactions().to_vec()
        }
    };
    let applied = apply_mappings(merchants.get_all_mappings(), &mut transactions);
    log::debug!("Applied merchant mappings to {applied} transactions");
    Ok(transactions)
}

fn load_accounts(config: &ConfigStore, cache: &mut CacheStore, from_file: Option<&Path>) -> Result<Vec<Account>> {
    match from_file {
        Some(path) => {
            let fresh = importer::read_accounts(path)?;
            if registry::cache_enabled(config) {
                cache.set_accounts(fresh.clone());
                report_cache_write_error(cache.last_write_error());
            }
            Ok(fresh)
        }
        None => {
            if cache.account_entry().last_update.is_none() {
                warn("no cached accounts; run `moneta cache import --accounts <file>` or pass --from-file");
            }
            Ok(cache.accounts().to_vec())
        }
    }
}

fn restrict_to_default_accounts(config: &ConfigStore, filter: &FilterArgs, transactions: Vec<Transaction>) -> Vec<Transaction> {
    let defaults = registry::default_accounts(config);
    if filter.account.is_some() || defaults.is_empty() {
        return transactions;
    }
    transactions
        .into_iter()
        .filter(|t| t.account_id.as_ref().is_some_and(|id| defaults.contains(id)))
        .collect()
}

pub fn list(
    config: &ConfigStore,
    cache: &mut CacheStore,
    merchants: &MerchantStore,
    filter: FilterArgs,
    source: SourceArgs,
) -> Result<()> {
    let transactions = load_transactions(config, cache, merchants, source.from_file.as_deref())?;
    let transactions = restrict_to_default_accounts(config, &filter, transactions);
    let matched = filter_transactions(&transactions, &filter.into_filter());
    print_transactions(&matched, OutputFormat::from_config(config))
}

pub fn accounts(config: &ConfigStore, cache: &mut CacheStore, from_file: Option<&Path>) -> Result<()> {
    let accounts = load_accounts(config, cache, from_file)?;
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(&accounts);
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Balance"]);
    for account in &accounts {
        table.add_row(vec![
            Cell::new(&account.id),
            Cell::new(&account.name),
            Cell::new(account.kind.clone().unwrap_or_default()),
            Cell::new(account.balance.map(money).unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn spending(
    config: &ConfigStore,
    cache: &mut CacheStore,
    merchants: &MerchantStore,
    filter: FilterArgs,
    source: SourceArgs,
    top: usize,
) -> Result<()> {
    let transactions = load_transactions(config, cache, merchants, source.from_file.as_deref())?;
    let transactions = restrict_to_default_accounts(config, &filter, transactions);
    let matched = filter_transactions(&transactions, &filter.into_filter());
    let report = spending_by_category(&matched, top);

    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(&report);
    }

    let mut table = Table::new();
    table.set_header(vec!["Parent", "Category", "Amount", "Count", "%"]);
    for item in &report.categories {
        table.add_row(vec![
            Cell::new(&item.parent),
            Cell::new(&item.category),
            Cell::new(money(item.total)),
            Cell::new(item.count),
            Cell::new(format!("{:.1}%", item.pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(money(report.total).bold()),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Spending\n{table}");

    if !report.top_merchants.is_empty() {
        let mut merchants_table = Table::new();
        merchants_table.set_header(vec!["Merchant", "Amount", "Count"]);
        for m in &report.top_merchants {
            merchants_table.add_row(vec![
                Cell::new(&m.merchant),
                Cell::new(money(m.total)),
                Cell::new(m.count),
            ]);
        }
        println!("Top merchants\n{merchants_table}");
    }
    Ok(())
}

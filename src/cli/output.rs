use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::error::Result;
use crate::fmt::money;
use crate::models::Transaction;
use crate::registry;
use crate::settings::ConfigStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_config(config: &ConfigStore) -> Self {
        match registry::output_format(config).as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

pub fn warn(msg: &str) {
    eprintln!("{} {msg}", "Warning:".yellow().bold());
}

pub fn report_load_error(msg: Option<&str>) {
    if let Some(msg) = msg {
        warn(msg);
    }
}

pub fn report_cache_write_error(msg: Option<&str>) {
    if let Some(msg) = msg {
        warn(&format!("could not update the cache: {msg}"));
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_transactions(transactions: &[Transaction], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(transactions);
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Merchant", "Category", "Type", "Amount", "Account"]);
    for t in transactions {
        let amount = if t.amount < 0.0 {
            money(t.amount).red()
        } else {
            money(t.amount).green()
        };
        let category = match (&t.parent_category, &t.category) {
            (Some(parent), Some(category)) => format!("{parent} / {category}"),
            (None, Some(category)) => category.clone(),
            (Some(parent), None) => parent.clone(),
            (None, None) => String::new(),
        };
        table.add_row(vec![
            Cell::new(t.calendar_date().map(|d| d.to_string()).unwrap_or_else(|| t.date.clone())),
            Cell::new(t.merchant.clone().unwrap_or_default()),
            Cell::new(category),
            Cell::new(t.kind.clone().unwrap_or_default()),
            Cell::new(amount),
            Cell::new(t.account_id.clone().unwrap_or_default()),
        ]);
    }
    let total: f64 = transactions.iter().map(|t| t.amount).sum();
    println!("Transactions\n{table}");
    println!("{} transactions, net {}", transactions.len(), money(total));
    Ok(())
}

pub mod cache;
pub mod config;
pub mod merchants;
pub mod output;
pub mod queries;
pub mod transactions;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::filter::{Direction, TransactionFilter};

#[derive(Parser)]
#[command(
    name = "moneta",
    version,
    about = "Banking aggregation CLI: saved queries, merchant mappings and a local cache."
)]
pub struct Cli {
    /// Directory for config, cache, queries and merchant mappings (default: ~/.config/moneta)
    #[arg(long = "config-dir", global = true, env = "MONETA_CONFIG_DIR")]
    pub config_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage merchant category overrides.
    Merchants {
        #[command(subcommand)]
        command: MerchantsCommands,
    },
    /// Save and run named transaction queries.
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },
    /// Inspect, populate or clear the local cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// List transactions matching the given filters.
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List accounts.
    Accounts {
        /// Read accounts from an API export instead of the cache
        #[arg(long = "from-file")]
        from_file: Option<PathBuf>,
    },
    /// Spending breakdown by category.
    Spending {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        source: SourceArgs,
        /// Number of top merchants to show
        #[arg(long, default_value = "5")]
        top: usize,
    },
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show every known setting with its current value.
    List,
    /// Show one setting.
    Get { key: String },
    /// Change a setting.
    Set { key: String, value: String },
    /// Restore a setting to its default.
    Reset { key: String },
}

#[derive(Subcommand)]
pub enum MerchantsCommands {
    /// List merchant mappings.
    List,
    /// Map a merchant to a category.
    Set {
        /// Merchant name as it appears on transactions
        merchant: String,
        /// Parent category, e.g. 'Food'
        #[arg(long)]
        parent: String,
        /// Category, e.g. 'Supermarkets'
        #[arg(long)]
        category: String,
    },
    /// Remove a merchant mapping.
    Remove { merchant: String },
    /// Import mappings from a JSON file.
    Import {
        file: PathBuf,
        /// Keep existing mappings that the file does not mention
        #[arg(long)]
        merge: bool,
    },
    /// Export mappings as JSON (stdout when no file is given).
    Export { file: Option<PathBuf> },
    /// Remove all merchant mappings.
    Clear,
}

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Save a named query.
    Save {
        /// Letters, numbers, '-' and '_' (max 64)
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List saved queries, newest first.
    List,
    /// Show a saved query.
    Show { name: String },
    /// Run a saved query against cached (or exported) transactions.
    Run {
        name: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Delete a saved query.
    Delete { name: String },
    /// Rename a saved query.
    Rename { old_name: String, new_name: String },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show what is cached and when it was updated.
    Info,
    /// Populate the cache from API export files.
    Import {
        #[arg(long)]
        transactions: Option<PathBuf>,
        #[arg(long)]
        accounts: Option<PathBuf>,
    },
    /// Clear cached data (both collections unless one is named).
    Clear {
        #[arg(long)]
        accounts: bool,
        #[arg(long)]
        transactions: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Account id
    #[arg(long)]
    pub account: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "parent-category")]
    pub parent_category: Option<String>,
    /// Merchant names, comma-separated
    #[arg(long)]
    pub merchant: Option<String>,
    /// Transaction type, e.g. EFTPOS
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// 'in' or 'out'
    #[arg(long)]
    pub direction: Option<Direction>,
    /// Minimum absolute amount
    #[arg(long = "min-amount")]
    pub min_amount: Option<f64>,
    /// Maximum absolute amount
    #[arg(long = "max-amount")]
    pub max_amount: Option<f64>,
    /// Start date: YYYY-MM-DD
    #[arg(long)]
    pub since: Option<NaiveDate>,
    /// End date: YYYY-MM-DD
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn into_filter(self) -> TransactionFilter {
        TransactionFilter {
            account_id: self.account,
            category: self.category,
            parent_category: self.parent_category,
            merchant: self.merchant,
            kind: self.kind,
            direction: self.direction,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            since: self.since,
            until: self.until,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read transactions from an API export instead of the cache
    #[arg(long = "from-file")]
    pub from_file: Option<PathBuf>,
}

mod cache;
mod cli;
mod error;
mod filter;
mod fmt;
mod importer;
mod merchants;
mod models;
mod queries;
mod registry;
mod reports;
mod settings;
mod store;

use std::path::Path;

use clap::{CommandFactory, Parser};

use cache::CacheStore;
use cli::output::{report_load_error, warn};
use cli::{CacheCommands, Cli, Commands, ConfigCommands, MerchantsCommands, QueryCommands};
use error::Result;
use merchants::MerchantStore;
use queries::QueryStore;
use settings::{default_config_dir, shellexpand_path, ConfigStore};

fn open_config(dir: &Path) -> ConfigStore {
    let config = ConfigStore::open(dir);
    report_load_error(config.load_error());
    config
}

fn open_cache(dir: &Path) -> CacheStore {
    let cache = CacheStore::open(dir);
    report_load_error(cache.load_error_message());
    cache
}

fn open_merchants(dir: &Path) -> MerchantStore {
    let merchants = MerchantStore::open(dir);
    report_load_error(merchants.load_error());
    merchants
}

fn open_queries(dir: &Path) -> QueryStore {
    let queries = QueryStore::open(dir);
    report_load_error(queries.load_error());
    queries
}

fn run(command: Commands, dir: &Path) -> Result<()> {
    match command {
        Commands::Config { command } => {
            let mut config = open_config(dir);
            match command {
                ConfigCommands::List => cli::config::list(&config),
                ConfigCommands::Get { key } => cli::config::get(&config, &key),
                ConfigCommands::Set { key, value } => cli::config::set(&mut config, &key, &value),
                ConfigCommands::Reset { key } => cli::config::reset(&mut config, &key),
            }
        }
        Commands::Merchants { command } => {
            let config = open_config(dir);
            let mut merchants = open_merchants(dir);
            match command {
                MerchantsCommands::List => cli::merchants::list(&merchants, &config),
                MerchantsCommands::Set {
                    merchant,
                    parent,
                    category,
                } => cli::merchants::set(&mut merchants, &merchant, &parent, &category),
                MerchantsCommands::Remove { merchant } => cli::merchants::remove(&mut merchants, &merchant),
                MerchantsCommands::Import { file, merge } => cli::merchants::import(&mut merchants, &file, merge),
                MerchantsCommands::Export { file } => cli::merchants::export(&merchants, file.as_deref()),
                MerchantsCommands::Clear => cli::merchants::clear(&mut merchants),
            }
        }
        Commands::Query { command } => {
            let config = open_config(dir);
            let mut queries = open_queries(dir);
            match command {
                QueryCommands::Save {
                    name,
                    description,
                    filter,
                } => cli::queries::save(&mut queries, &name, description, filter),
                QueryCommands::List => cli::queries::list(&queries, &config),
                QueryCommands::Show { name } => cli::queries::show(&queries, &config, &name),
                QueryCommands::Run { name, source } => {
                    let mut cache = open_cache(dir);
                    let merchants = open_merchants(dir);
                    cli::queries::run(&mut queries, &config, &mut cache, &merchants, &name, source)
                }
                QueryCommands::Delete { name } => cli::queries::delete(&mut queries, &name),
                QueryCommands::Rename { old_name, new_name } => {
                    cli::queries::rename(&mut queries, &old_name, &new_name)
                }
            }
        }
        Commands::Cache { command } => {
            let config = open_config(dir);
            let mut cache = open_cache(dir);
            match command {
                CacheCommands::Info => cli::cache::info(&cache, &config),
                CacheCommands::Import {
                    transactions,
                    accounts,
                } => cli::cache::import(&mut cache, transactions, accounts),
                CacheCommands::Clear {
                    accounts,
                    transactions,
                } => cli::cache::clear(&mut cache, accounts, transactions),
            }
        }
        Commands::Transactions { filter, source } => {
            let config = open_config(dir);
            let mut cache = open_cache(dir);
            let merchants = open_merchants(dir);
            cli::transactions::list(&config, &mut cache, &merchants, filter, source)
        }
        Commands::Accounts { from_file } => {
            let config = open_config(dir);
            let mut cache = open_cache(dir);
            cli::transactions::accounts(&config, &mut cache, from_file.as_deref())
        }
        Commands::Spending { filter, source, top } => {
            let config = open_config(dir);
            let mut cache = open_cache(dir);
            let merchants = open_merchants(dir);
            cli::transactions::spending(&config, &mut cache, &merchants, filter, source, top)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "moneta", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let dir = cli
        .config_dir
        .as_deref()
        .map(shellexpand_path)
        .unwrap_or_else(default_config_dir);
    if let Err(e) = store::ensure_directory(&dir) {
        warn(&format!("could not create {}: {e}", dir.display()));
    }
    log::debug!("Using config directory {}", dir.display());

    if let Err(e) = run(cli.command, &dir) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

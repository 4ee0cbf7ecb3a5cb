use comfy_table::{Cell, Table};

use crate::cli::output::{print_json, print_transactions, OutputFormat};
use crate::cli::transactions::load_transactions;
use crate::cli::{FilterArgs, SourceArgs};
use crate::cache::CacheStore;
use crate::error::{MonetaError, Result};
use crate::filter::filter_transactions;
use crate::fmt::timestamp;
use crate::merchants::MerchantStore;
use crate::queries::{validate_query_name, QueryStore};
use crate::settings::ConfigStore;

pub fn save(
    store: &mut QueryStore,
    name: &str,
    description: Option<String>,
    filter: FilterArgs,
) -> Result<()> {
    let check = validate_query_name(name);
    if let Some(msg) = check.error {
        return Err(MonetaError::Validation(msg));
    }
    if store.exists(name) {
        return Err(MonetaError::Other(format!(
            "A query named '{name}' already exists. Delete it first or pick another name."
        )));
    }
    let query = store.save(name, filter.into_filter(), description)?;
    println!("Saved query '{}': {}", query.name, query.filters.describe());
    Ok(())
}

pub fn list(store: &QueryStore, config: &ConfigStore) -> Result<()> {
    let queries = store.list();
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(&queries);
    }
    if queries.is_empty() {
        println!("No saved queries. Create one with `moneta query save <name> --merchant ...`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Filters", "Description", "Created", "Last used"]);
    for q in queries {
        table.add_row(vec![
            Cell::new(&q.name),
            Cell::new(q.filters.describe()),
            Cell::new(q.description.clone().unwrap_or_default()),
            Cell::new(timestamp(Some(q.created_at))),
            Cell::new(timestamp(q.last_used)),
        ]);
    }
    println!("Saved queries\n{table}");
    Ok(())
}

pub fn show(store: &QueryStore, config: &ConfigStore, name: &str) -> Result<()> {
    let query = store
        .get(name)
        .ok_or_else(|| MonetaError::Other(format!("No saved query named '{name}'")))?;
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(query);
    }
    println!("Name:        {}", query.name);
    println!("Description: {}", query.description.as_deref().unwrap_or("(none)"));
    println!("Filters:     {}", query.filters.describe());
    println!("Created:     {}", timestamp(Some(query.created_at)));
    println!("Last used:   {}", timestamp(query.last_used));
    Ok(())
}

pub fn run(
    store: &mut QueryStore,
    config: &ConfigStore,
    cache: &mut CacheStore,
    merchants: &MerchantStore,
    name: &str,
    source: SourceArgs,
) -> Result<()> {
    let filters = store
        .get(name)
        .map(|q| q.filters.clone())
        .ok_or_else(|| MonetaError::Other(format!("No saved query named '{name}'")))?;
    let transactions = load_transactions(config, cache, merchants, source.from_file.as_deref())?;
    let matched = filter_transactions(&transactions, &filters);
    store.mark_used(name)?;
    print_transactions(&matched, OutputFormat::from_config(config))
}

pub fn delete(store: &mut QueryStore, name: &str) -> Result<()> {
    if store.delete(name)? {
        println!("Deleted query '{name}'");
        Ok(())
    } else {
        Err(MonetaError::Other(format!("No saved query named '{name}'")))
    }
}

pub fn rename(store: &mut QueryStore, old_name: &str, new_name: &str) -> Result<()> {
    if !store.exists(old_name) {
        return Err(MonetaError::Other(format!("No saved query named '{old_name}'")));
    }
    if !store.rename(old_name, new_name)? {
        return Err(MonetaError::Other(format!(
            "A query named '{new_name}' already exists"
        )));
    }
    println!("Renamed '{old_name}' to '{new_name}'");
    Ok(())
}

use std::path::Path;

use comfy_table::{Cell, Table};

use crate::cli::output::{print_json, OutputFormat};
use crate::error::Result;
use crate::merchants::{merge_mappings, parse_import, MerchantCategory, MerchantStore};
use crate::settings::ConfigStore;
use crate::store::write_json;

pub fn list(store: &MerchantStore, config: &ConfigStore) -> Result<()> {
    let mappings = store.get_all_mappings();
    if OutputFormat::from_config(config) == OutputFormat::Json {
        return print_json(mappings);
    }
    if mappings.is_empty() {
        println!("No merchant mappings. Add one with `moneta merchants set`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Parent", "Category"]);
    for (merchant, mapping) in mappings {
        table.add_row(vec![
            Cell::new(merchant),
            Cell::new(&mapping.parent),
            Cell::new(&mapping.category),
        ]);
    }
    println!("Merchant mappings\n{table}");
    Ok(())
}

pub fn set(store: &mut MerchantStore, merchant: &str, parent: &str, category: &str) -> Result<()> {
    let mapping = MerchantCategory::new(parent, category)?;
    let previous = store
        .get_mapping(merchant)
        .map(|m| format!(" (was {} / {})", m.parent, m.category));
    store.upsert_merchant_category(merchant, mapping)?;
    match previous {
        Some(was) => println!(
            "Updated mapping: '{}' \u{2192} {parent} / {category}{was}",
            merchant.trim()
        ),
        None => println!("Added mapping: '{}' \u{2192} {parent} / {category}", merchant.trim()),
    }
    Ok(())
}

pub fn remove(store: &mut MerchantStore, merchant: &str) -> Result<()> {
    if store.remove_mapping(merchant)? {
        println!("Removed mapping for '{}'", merchant.trim());
    } else {
        println!("No mapping for '{}'", merchant.trim());
    }
    Ok(())
}

pub fn import(store: &mut MerchantStore, file: &Path, merge: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let imported = parse_import(&content)?;
    let count = imported.len();
    let before = store.get_all_mappings().len();
    let added = imported.keys().filter(|k| !store.has_merchant_mapping(k)).count();
    let combined = merge_mappings(store.get_all_mappings(), imported, merge);
    let total = combined.len();
    store.replace_all(combined)?;
    if merge {
        println!("Imported {count} mappings ({added} new), {total} total");
    } else {
        println!("Replaced {before} mappings with {count} from {}", file.display());
    }
    Ok(())
}

pub fn export(store: &MerchantStore, file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => {
            write_json(path, store.get_all_mappings())?;
            println!(
                "Exported {} mappings to {}",
                store.get_all_mappings().len(),
                path.display()
            );
            Ok(())
        }
        None => print_json(store.get_all_mappings()),
    }
}

pub fn clear(store: &mut MerchantStore) -> Result<()> {
    let count = store.get_all_mappings().len();
    store.clear_all_mappings()?;
    println!("Cleared {count} merchant mappings");
    Ok(())
}

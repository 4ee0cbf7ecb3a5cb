use std::collections::HashMap;

use serde::Serialize;

use crate::models::Transaction;

const UNCATEGORIZED: &str = "Uncategorized";

// ---------------------------------------------------------------------------
// Spending by category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub parent: String,
    pub category: String,
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantSpend {
    pub merchant: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingBreakdown {
    pub categories: Vec<CategorySpend>,
    pub total: f64,
    pub top_merchants: Vec<MerchantSpend>,
}

fn label(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

fn by_total_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

/// Groups outflows by parent and category. Totals are positive spend.
pub fn spending_by_category(transactions: &[Transaction], top_n: usize) -> SpendingBreakdown {
    let outflows: Vec<&Transaction> = transactions.iter().filter(|t| t.amount < 0.0).collect();
    let total: f64 = outflows.iter().map(|t| -t.amount).sum();

    let mut groups: HashMap<(String, String), (f64, usize)> = HashMap::new();
    for t in &outflows {
        let key = (label(t.parent_category.as_deref()), label(t.category.as_deref()));
        let entry = groups.entry(key).or_default();
        entry.0 += -t.amount;
        entry.1 += 1;
    }
    let mut categories: Vec<CategorySpend> = groups
        .into_iter()
        .map(|((parent, category), (sum, count))| CategorySpend {
            parent,
            category,
            total: sum,
            count,
            pct: if total != 0.0 { sum / total * 100.0 } else { 0.0 },
        })
        .collect();
    categories.sort_by(|a, b| {
        by_total_desc(a.total, b.total)
            .then_with(|| a.parent.cmp(&b.parent))
            .then_with(|| a.category.cmp(&b.category))
    });

    SpendingBreakdown {
        categories,
        total,
        top_merchants: top_merchants(&outflows, top_n),
    }
}

fn top_merchants(outflows: &[&Transaction], n: usize) -> Vec<MerchantSpend> {
    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
    for t in outflows {
        let Some(merchant) = t.merchant.as_deref().map(str::trim).filter(|m| !m.is_empty()) else {
            continue;
        };
        let entry = groups.entry(merchant.to_string()).or_default();
        entry.0 += -t.amount;
        entry.1 += 1;
    }
    let mut merchants: Vec<MerchantSpend> = groups
        .into_iter()
        .map(|(merchant, (total, count))| MerchantSpend {
            merchant,
            total,
            count,
        })
        .collect();
    merchants.sort_by(|a, b| by_total_desc(a.total, b.total).then_with(|| a.merchant.cmp(&b.merchant)));
    merchants.truncate(n);
    merchants
}

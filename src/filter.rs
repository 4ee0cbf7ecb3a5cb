use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(format!("direction must be 'in' or 'out', got '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Sparse set of predicates; unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<String>,
    /// Comma-separated merchant names, any of which may match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self == &TransactionFilter::default()
    }

    fn merchant_tokens(&self) -> Vec<String> {
        self.merchant
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Human-readable summary, e.g. `merchant=Countdown direction=out`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let mut push = |label: &str, value: Option<String>| {
            if let Some(v) = value {
                parts.push(format!("{label}={v}"));
            }
        };
        push("account", self.account_id.clone());
        push("category", self.category.clone());
        push("parent", self.parent_category.clone());
        push("merchant", self.merchant.clone());
        push("type", self.kind.clone());
        push("direction", self.direction.map(|d| d.to_string()));
        push("min", self.min_amount.map(|a| a.to_string()));
        push("max", self.max_amount.map(|a| a.to_string()));
        push("since", self.since.map(|d| d.to_string()));
        push("until", self.until.map(|d| d.to_string()));
        if parts.is_empty() {
            "(all transactions)".to_string()
        } else {
            parts.join(" ")
        }
    }
}

fn exact(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected {
        Some(want) => actual == Some(want.as_str()),
        None => true,
    }
}

/// True when every predicate set on `filter` holds for `transaction`.
pub fn matches(transaction: &Transaction, filter: &TransactionFilter) -> bool {
    if !exact(&filter.account_id, transaction.account_id.as_deref())
        || !exact(&filter.category, transaction.category.as_deref())
        || !exact(&filter.parent_category, transaction.parent_category.as_deref())
        || !exact(&filter.kind, transaction.kind.as_deref())
    {
        return false;
    }

    let merchants = filter.merchant_tokens();
    if !merchants.is_empty() {
        let Some(merchant) = transaction.merchant.as_deref() else {
            return false;
        };
        let merchant = merchant.trim().to_lowercase();
        if !merchants.iter().any(|m| *m == merchant) {
            return false;
        }
    }

    match filter.direction {
        Some(Direction::Out) if transaction.amount >= 0.0 => return false,
        Some(Direction::In) if transaction.amount < 0.0 => return false,
        _ => {}
    }

    let magnitude = transaction.amount.abs();
    if filter.min_amount.is_some_and(|min| magnitude < min)
        || filter.max_amount.is_some_and(|max| magnitude > max)
    {
        return false;
    }

    if filter.since.is_some() || filter.until.is_some() {
        let Some(date) = transaction.calendar_date() else {
            return false;
        };
        if filter.since.is_some_and(|since| date < since)
            || filter.until.is_some_and(|until| date > until)
        {
            return false;
        }
    }

    true
}

/// Matching transactions in their original order.
pub fn filter_transactions(transactions: &[Transaction], filter: &TransactionFilter) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| matches(t, filter))
        .cloned()
        .collect()
}

//! Resolving what the operator typed into orders.

use crate::client::ShipStation;
use crate::error::{Result, WarehouseError};
use crate::models::{Order, OrderStatus};
use crate::transport::Transport;
use serde::Serialize;
use std::collections::BTreeSet;

/// Minimum similarity (0.0..=1.0) for a fuzzy name match
pub const FUZZY_THRESHOLD: f64 = 0.65;

/// What a free-form query resolved to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Lookup {
    /// The query was an order number and that order exists
    One { order: Order },
    /// The query was a name; zero or more candidates, best first
    Many { orders: Vec<Order> },
}

/// An order number is all ASCII digits, optionally prefixed with `#`
pub fn as_order_number(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best of several similarity measures between a query and a name, both
/// already lowercased
fn similarity(query: &str, name: &str) -> f64 {
    let whole = strsim::normalized_levenshtein(query, name);
    let reordered = strsim::normalized_levenshtein(&sorted_tokens(query), &sorted_tokens(name));
    // A one-word query against any single word of the name
    let partial = if query.split_whitespace().count() == 1 {
        name.split_whitespace()
            .map(|token| strsim::normalized_levenshtein(query, token))
            .fold(0.0, f64::max)
    } else {
        0.0
    };
    whole.max(reordered).max(partial)
}

/// Filter `orders` by customer name: case-insensitive substring matches if
/// there are any, otherwise fuzzy matches at or above `FUZZY_THRESHOLD`,
/// best first
pub fn match_customer_name(orders: Vec<Order>, name: &str) -> Vec<Order> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let named: Vec<(Order, String)> = orders
        .into_iter()
        .filter_map(|o| {
            let customer = o.customer_name.clone()?.to_lowercase();
            (!customer.is_empty()).then_some((o, customer))
        })
        .collect();

    if named.iter().any(|(_, customer)| customer.contains(&needle)) {
        return named
            .into_iter()
            .filter(|(_, customer)| customer.contains(&needle))
            .map(|(o, _)| o)
            .collect();
    }

    tracing::info!(query = %name, "no exact name match, trying fuzzy search");
    let mut scored: Vec<(f64, Order)> = named
        .into_iter()
        .map(|(o, customer)| (similarity(&needle, &customer), o))
        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, o)| o).collect()
}

impl<T: Transport> ShipStation<T> {
    /// Orders awaiting shipment whose customer name matches `name`.
    /// No match is an empty vector, not an error.
    pub fn search_orders(&self, name: &str) -> Result<Vec<Order>> {
        if name.trim().is_empty() {
            return Err(WarehouseError::InvalidInput("search term is empty".to_string()));
        }
        let orders = self.list_orders(OrderStatus::AwaitingShipment)?;
        let matches = match_customer_name(orders, name);
        tracing::debug!(query = %name, matches = matches.len(), "searched orders");
        Ok(matches)
    }

    /// Resolve a query that is either an order number or a customer name
    pub fn find(&self, query: &str) -> Result<Lookup> {
        match as_order_number(query) {
            Some(number) => Ok(Lookup::One {
                order: self.get_order(number)?,
            }),
            None => Ok(Lookup::Many {
                orders: self.search_orders(query)?,
            }),
        }
    }

    /// Unique customer emails on awaiting-shipment orders containing a
    /// product whose SKU or name includes `product`
    pub fn customer_emails(&self, product: &str) -> Result<Vec<String>> {
        if product.trim().is_empty() {
            return Err(WarehouseError::InvalidInput("product is empty".to_string()));
        }
        let emails: BTreeSet<String> = self
            .list_orders(OrderStatus::AwaitingShipment)?
            .into_iter()
            .filter(|o| o.contains_product(product.trim()))
            .filter_map(|o| o.customer_email)
            .filter(|e| !e.is_empty())
            .collect();
        Ok(emails.into_iter().collect())
    }
}

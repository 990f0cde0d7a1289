//! Reorder command: apply custom orders to result arrays.

use super::io::{print_json, read_document};
use anyhow::{Context, Result};
use esmap::{reorder, OrderLevel};

/// `by` holds one key per level; `orders` one comma-separated list per level.
pub fn run_reorder(input: &str, target: &str, by: &[String], orders: &[String]) -> Result<()> {
    if by.len() != orders.len() {
        anyhow::bail!(
            "Got {} ordering key(s) but {} --order list(s)",
            by.len(),
            orders.len()
        );
    }

    let levels: Vec<OrderLevel> = by
        .iter()
        .zip(orders)
        .map(|(key, order)| OrderLevel::new(key.as_str(), parse_order_list(order)))
        .collect();

    let document = read_document(input)?;
    let reordered = reorder(&document, target, &levels)
        .with_context(|| format!("Failed to reorder '{}'", target))?;
    print_json(&reordered)
}

fn parse_order_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

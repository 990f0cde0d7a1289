//! Move command: move a subtree of a search request to another path.

use super::io::{print_json, read_document};
use anyhow::{Context, Result};
use esmap::query::move_node;

pub fn run_move(input: &str, from: &str, to: &str) -> Result<()> {
    let query = read_document(input)?;
    let moved = move_node(&query, to, from)
        .with_context(|| format!("Failed to move '{}' to '{}'", from, to))?;
    print_json(&moved)
}

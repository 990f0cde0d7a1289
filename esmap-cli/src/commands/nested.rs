//! Merge-nested command: merge nested clauses sharing a path.

use super::io::{print_json, read_document};
use anyhow::Result;
use esmap::query::merge_nested_filters;

/// Prints the merged document even when some steps failed, then reports
/// the failures through the exit status.
pub fn run_merge_nested(input: &str) -> Result<()> {
    let query = read_document(input)?;
    let merged = merge_nested_filters(&query);
    print_json(&merged.document)?;

    if !merged.is_clean() {
        for failure in &merged.failures {
            tracing::error!("{}", failure);
        }
        anyhow::bail!(
            "{} merge step(s) failed; output is partially merged",
            merged.failures.len()
        );
    }
    Ok(())
}

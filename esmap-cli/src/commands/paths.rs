//! Bucket-paths command: list bucketing aggregations of a search request.

use super::io::{print_json, read_document};
use anyhow::Result;
use esmap::query::find_bucket_paths;

/// Run the bucket-paths command.
pub fn run_bucket_paths(input: &str) -> Result<()> {
    let query = read_document(input)?;
    let paths = find_bucket_paths(&query);
    tracing::debug!("Found {} bucket aggregations", paths.len());
    print_json(&paths)
}

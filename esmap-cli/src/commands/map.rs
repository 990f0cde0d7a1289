//! Map command: flatten the aggregations of a search response.

use super::io::{print_json, read_document};
use anyhow::Result;
use esmap::{walk, MappingOptions};

/// Run the map command.
pub fn run_map(input: &str, options: MappingOptions) -> Result<()> {
    let response = read_document(input)?;
    let mapped = walk(&response, options);

    tracing::info!(
        "Mapped {} rows (mapping type {:?})",
        mapped.data.len(),
        mapped.mapping_type.as_str()
    );
    print_json(&mapped)
}

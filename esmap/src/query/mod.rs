//! Query document rewriting
//!
//! Helpers applied to a search request body before it is sent:
//! aggregation path discovery, subtree moves and nested clause merging.

mod mover;
mod nested;
mod paths;
pub mod types;

pub use mover::move_node;
pub use nested::{merge_nested_filters, merge_nested_filters_lossy, Merged};
pub use paths::find_bucket_paths;
pub use types::{BucketAggKind, ClauseKind, NestedClause, NestedQuery};

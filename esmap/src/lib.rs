//! Elasticsearch aggregation flattening and query rewriting
//!
//! Turns the nested `aggregations` section of a search response into flat,
//! chart-ready rows, and rewrites search request bodies before they are sent.
//!
//! # Result mapping
//!
//! - [`walk`] - rows plus an inferred [`MappingType`]
//! - [`reorder`] - custom one- or two-level ordering of result arrays
//!
//! Supported result shapes per aggregation level:
//! - bucket arrays (`terms`, `histogram`, `date_histogram`)
//! - keyed buckets (`filters`, keyed `range`)
//! - single-bucket wrappers (`nested`, `filter`), up to three levels deep
//! - `top_hits`, optionally under a `reverse_nested` named `rn`
//! - bare metrics
//!
//! # Query rewriting
//!
//! - [`query::find_bucket_paths`] - paths of bucketing aggregations
//! - [`query::move_node`] - move a subtree
//! - [`query::merge_nested_filters`] - one `nested` clause per path

pub mod config;
pub mod error;
pub mod key;
pub mod mapping;
pub mod path;
pub mod query;
pub mod reorder;

pub use config::Config;
pub use error::EsMapError;
pub use key::{key_to_string, normalize_key};
pub use mapping::{
    key_value_data, walk, walk_aggregations, AggregationMapper, Datum, Mapped, MappingOptions,
    MappingType,
};
pub use reorder::{reorder, OrderLevel};

/// Result type for esmap operations
pub type Result<T> = std::result::Result<T, EsMapError>;

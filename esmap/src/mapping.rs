//! Aggregation result mapping into chart-ready datums
//!
//! Walks the `aggregations` section of a search response and flattens every
//! bucket level into [`Datum`] rows. The shape of each level is decided once
//! by [`NodeShape::detect`]; the walk then dispatches on that shape.

use crate::key::{flat_label, LABEL_SEPARATOR};
use crate::path::{lookup, select, DocPath};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, trace, warn};

/// One output row: always `key` and `value` for bucket rows
pub type Datum = Map<String, Value>;

/// Levels deeper than this are not descended
pub const MAX_WALK_DEPTH: usize = 64;

/// Bucket bookkeeping members, never treated as sibling aggregations
const BOOKKEEPING_KEYS: [&str; 3] = ["key", "doc_count", "key_as_string"];

/// Paths overriding a bucket's `doc_count` as its value. Later entries win.
const VALUE_OVERRIDES: [&str; 3] = [
    // unique count under a nested terms aggregation
    "parent_count.unique.value",
    // first sibling metric
    "*.value",
    // explicit distinct count metric
    "Distinct_Count.value",
];

/// Bucket containers, tried shallowest first
const BUCKET_CONTAINERS: [&str; 3] = ["*.buckets", "*.*.buckets", "*.*.*.buckets"];

const TOP_HITS_SOURCES: &str = "*.hits.hits.#._source";

/// Inferred output shape of a mapped result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MappingType {
    #[default]
    #[serde(rename = "")]
    Plain,
    #[serde(rename = "multiSeries")]
    MultiSeries,
}

impl MappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::MultiSeries => "multiSeries",
        }
    }

    /// A child's non-plain type overrides ours
    pub fn merge_child(self, child: MappingType) -> MappingType {
        match child {
            MappingType::Plain => self,
            other => other,
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Walker switches.
///
/// `direct_doc_count` implies `flat`, which implies `multi_series`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Take sibling values from their `doc_count` and drop nested `data`
    pub direct_doc_count: bool,
    /// Add `"<parent key> - <field>"` columns for siblings and child fields
    pub flat: bool,
    /// Copy every sibling aggregation onto the row
    pub multi_series: bool,
    /// Collapse child rows into one column per child key
    pub stacked: bool,
}

impl MappingOptions {
    /// Resolve the implication chain
    pub fn effective(self) -> Self {
        let flat = self.flat || self.direct_doc_count;
        Self {
            direct_doc_count: self.direct_doc_count,
            flat,
            multi_series: self.multi_series || flat,
            stacked: self.stacked,
        }
    }

    /// Union of two option sets
    pub fn merge(self, other: MappingOptions) -> Self {
        Self {
            direct_doc_count: self.direct_doc_count || other.direct_doc_count,
            flat: self.flat || other.flat,
            multi_series: self.multi_series || other.multi_series,
            stacked: self.stacked || other.stacked,
        }
    }
}

/// Result of mapping one response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mapped {
    pub mapping_type: MappingType,
    pub data: Vec<Datum>,
}

/// Shape of a single aggregation level
#[derive(Debug)]
enum NodeShape<'a> {
    /// Object-style buckets, e.g. `filters` or keyed `range`
    KeyedBuckets(&'a Map<String, Value>),
    BucketArray(&'a [Value]),
    /// Single-bucket aggregations without a `buckets` wrapper. Only object
    /// members other than bucket bookkeeping keys become child buckets.
    Inline(&'a Map<String, Value>),
    /// Hit sources, followed by whatever metric shape the same level has
    TopHits {
        sources: Vec<&'a Value>,
        reverse_nested_count: Option<&'a Value>,
        then: Box<NodeShape<'a>>,
    },
    MetricOnly(&'a Value),
    SiblingMetrics(&'a Map<String, Value>),
    Empty,
}

impl<'a> NodeShape<'a> {
    fn detect(node: &'a Value) -> Self {
        if let Some(container) = BUCKET_CONTAINERS.iter().find_map(|p| lookup(node, p)) {
            return match container {
                Value::Object(map) => NodeShape::KeyedBuckets(map),
                Value::Array(items) => NodeShape::BucketArray(items),
                _ => NodeShape::Empty,
            };
        }

        if lookup(node, "*.*.hits").is_none() && lookup(node, "*.doc_count").is_some() {
            if let Value::Object(map) = node {
                return NodeShape::Inline(map);
            }
        }

        let reverse_nested = node.get("rn");
        let scope = reverse_nested.unwrap_or(node);

        let sources: Vec<&Value> = DocPath::parse(TOP_HITS_SOURCES)
            .map(|path| select(scope, &path).into_iter().map(|(_, v)| v).collect())
            .unwrap_or_default();
        let metrics = Self::detect_metrics(scope);
        if !sources.is_empty() {
            return NodeShape::TopHits {
                sources,
                reverse_nested_count: reverse_nested.and_then(|rn| rn.get("doc_count")),
                then: Box::new(metrics),
            };
        }
        metrics
    }

    fn detect_metrics(scope: &'a Value) -> Self {
        if let Some(value) = lookup(scope, "metricOnly.value") {
            return NodeShape::MetricOnly(value);
        }

        if lookup(scope, "*.value").is_some() {
            if let Value::Object(map) = scope {
                return NodeShape::SiblingMetrics(map);
            }
        }

        NodeShape::Empty
    }

    fn name(&self) -> &'static str {
        match self {
            NodeShape::KeyedBuckets(_) => "keyed_buckets",
            NodeShape::BucketArray(_) => "bucket_array",
            NodeShape::Inline(_) => "inline",
            NodeShape::TopHits { .. } => "top_hits",
            NodeShape::MetricOnly(_) => "metric_only",
            NodeShape::SiblingMetrics(_) => "sibling_metrics",
            NodeShape::Empty => "empty",
        }
    }
}

/// Maps aggregation results with a fixed set of options
pub struct AggregationMapper {
    options: MappingOptions,
}

impl AggregationMapper {
    pub fn new(options: MappingOptions) -> Self {
        Self {
            options: options.effective(),
        }
    }

    /// Map the `aggregations` section of a full search response
    pub fn map_response(&self, response: &Value) -> Mapped {
        match response.get("aggregations") {
            Some(aggs) => self.map_aggregations(aggs),
            None => Mapped::default(),
        }
    }

    /// Map an aggregation node directly
    pub fn map_aggregations(&self, aggs: &Value) -> Mapped {
        let (data, mapping_type) = self.walk_buckets(aggs, 0);
        debug!(
            datums = data.len(),
            mapping_type = %mapping_type,
            "Mapped aggregations"
        );
        Mapped { mapping_type, data }
    }

    fn walk_buckets(&self, node: &Value, depth: usize) -> (Vec<Datum>, MappingType) {
        if depth > MAX_WALK_DEPTH {
            warn!(depth, "Aggregation nesting exceeds limit, not descending");
            return (Vec::new(), MappingType::Plain);
        }

        let shape = NodeShape::detect(node);
        trace!(shape = shape.name(), depth, "Detected aggregation shape");
        self.map_shape(shape, depth)
    }

    fn map_shape(&self, shape: NodeShape<'_>, depth: usize) -> (Vec<Datum>, MappingType) {
        match shape {
            NodeShape::KeyedBuckets(map) => self.process_all(
                map.iter().map(|(k, v)| (Value::String(k.clone()), v)),
                depth,
            ),
            NodeShape::BucketArray(items) => self.process_all(
                items
                    .iter()
                    .map(|b| (b.get("key").cloned().unwrap_or(Value::Null), b)),
                depth,
            ),
            NodeShape::Inline(map) => self.process_all(
                map.iter()
                    .filter(|(k, v)| !BOOKKEEPING_KEYS.contains(&k.as_str()) && v.is_object())
                    .map(|(k, v)| (Value::String(k.clone()), v)),
                depth,
            ),
            NodeShape::TopHits {
                sources,
                reverse_nested_count,
                then,
            } => {
                let rn = reverse_nested_count.cloned().unwrap_or(Value::Null);
                let mut data: Vec<Datum> = sources
                    .into_iter()
                    .map(|source| {
                        let mut source = source.as_object().cloned().unwrap_or_default();
                        source.insert("rn".to_string(), rn.clone());
                        let mut datum = Datum::new();
                        datum.insert("source".to_string(), Value::Object(source));
                        datum
                    })
                    .collect();
                let (metrics, mapping_type) = self.map_shape(*then, depth);
                data.extend(metrics);
                (data, mapping_type)
            }
            NodeShape::MetricOnly(value) => {
                let mut datum = Datum::new();
                datum.insert("value".to_string(), value.clone());
                (vec![datum], MappingType::Plain)
            }
            NodeShape::SiblingMetrics(map) => {
                let data = map
                    .iter()
                    .filter(|(k, _)| !BOOKKEEPING_KEYS.contains(&k.as_str()))
                    .map(|(name, metric)| {
                        let mut datum = Datum::new();
                        datum.insert("key".to_string(), Value::String(name.clone()));
                        datum.insert(
                            "value".to_string(),
                            metric.get("value").cloned().unwrap_or(Value::Null),
                        );
                        datum
                    })
                    .collect();
                (data, MappingType::Plain)
            }
            NodeShape::Empty => (Vec::new(), MappingType::Plain),
        }
    }

    fn process_all<'a>(
        &self,
        buckets: impl Iterator<Item = (Value, &'a Value)>,
        depth: usize,
    ) -> (Vec<Datum>, MappingType) {
        buckets.fold(
            (Vec::new(), MappingType::Plain),
            |(mut data, mapping_type), (key, bucket)| {
                let (datum, bucket_type) = self.process_bucket(key, bucket, depth);
                data.push(datum);
                (data, mapping_type.merge_child(bucket_type))
            },
        )
    }

    fn process_bucket(&self, key: Value, bucket: &Value, depth: usize) -> (Datum, MappingType) {
        let opts = &self.options;
        let mut datum = Datum::new();
        let mut mapping_type = MappingType::Plain;

        let value = VALUE_OVERRIDES
            .iter()
            .filter_map(|p| lookup(bucket, p))
            .last()
            .or_else(|| bucket.get("doc_count"))
            .cloned()
            .unwrap_or(Value::Null);
        datum.insert("key".to_string(), key.clone());
        datum.insert("value".to_string(), value);

        if opts.multi_series {
            for (name, sibling) in bucket.as_object().into_iter().flatten() {
                if BOOKKEEPING_KEYS.contains(&name.as_str()) {
                    continue;
                }
                let copied = match (sibling.get("value"), sibling.get("doc_count")) {
                    (Some(value), _) => value.clone(),
                    (None, Some(count)) if opts.direct_doc_count => count.clone(),
                    _ => sibling.clone(),
                };
                datum.insert(name.clone(), copied.clone());
                if opts.flat && !opts.direct_doc_count {
                    datum.insert(flat_label(&key, name), copied);
                }
                mapping_type = MappingType::MultiSeries;
            }
        }

        let (children, child_type) = self.walk_buckets(bucket, depth + 1);
        if !children.is_empty() {
            let mut extra = Vec::new();

            if opts.flat {
                for child in &children {
                    for (field, value) in child {
                        if field == "key" || field == "value" {
                            continue;
                        }
                        let label = flat_label(&key, field);
                        if label.contains(LABEL_SEPARATOR) {
                            extra.push((label, value.clone()));
                        }
                    }
                }
            }

            if opts.stacked {
                for child in &children {
                    let name = stack_field_name(child.get("key").unwrap_or(&Value::Null));
                    extra.push((name, child.get("value").cloned().unwrap_or(Value::Null)));
                }
            }

            if !opts.direct_doc_count && !opts.stacked {
                datum.insert(
                    "data".to_string(),
                    Value::Array(children.into_iter().map(Value::Object).collect()),
                );
            }
            datum.extend(extra);

            if opts.stacked {
                datum.shift_remove("data");
                datum.shift_remove("value");
            }
        }

        (datum, mapping_type.merge_child(child_type))
    }
}

/// Column name for a stacked child: lower-cased, spaces as underscores
fn stack_field_name(key: &Value) -> String {
    value_to_string(key).to_lowercase().replace(' ', "_")
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => v.to_string(),
    }
}

/// Map `response.aggregations` with the given options
pub fn walk(response: &Value, options: MappingOptions) -> Mapped {
    AggregationMapper::new(options).map_response(response)
}

/// Map an aggregation node (the value under `aggregations`)
pub fn walk_aggregations(aggs: &Value, options: MappingOptions) -> Mapped {
    AggregationMapper::new(options).map_aggregations(aggs)
}

/// Datums of `response` with default options
pub fn key_value_data(response: &Value) -> Vec<Datum> {
    walk(response, MappingOptions::default()).data
}

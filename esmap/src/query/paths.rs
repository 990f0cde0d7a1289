//! Discovery of bucketing aggregation paths in a search request

use crate::mapping::MAX_WALK_DEPTH;
use crate::path::{DocPath, Segment};
use crate::query::types::BucketAggKind;
use serde_json::{Map, Value};
use tracing::warn;

const AGGS_KEYS: [&str; 2] = ["aggs", "aggregations"];

/// Dot path of every `terms`, `significant_terms` and `date_histogram`
/// aggregation in `query`, parents before children.
///
/// Children are read from the bucketing body's own `aggs` when present,
/// otherwise from the aggregation's `aggs`. Non-bucketing wrappers such as
/// `nested` or `filter` are not reported but are descended.
pub fn find_bucket_paths(query: &Value) -> Vec<String> {
    let mut out = Vec::new();
    if let Some((key, aggs)) = child_aggs(query) {
        visit(aggs, &DocPath::default().child(Segment::Key(key.to_string())), 0, &mut out);
    }
    out
}

fn visit(aggs: &Map<String, Value>, at: &DocPath, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_WALK_DEPTH {
        warn!(path = %at, "Aggregation nesting exceeds limit, not descending");
        return;
    }

    for (name, agg) in aggs {
        let here = at.child(Segment::Key(name.clone()));

        if let Some(kind) = BucketAggKind::of(agg) {
            out.push(here.to_string());

            let kind_body = agg.get(kind.as_str()).unwrap_or(&Value::Null);
            if let Some((key, children)) = child_aggs(kind_body) {
                let below = here
                    .child(Segment::Key(kind.as_str().to_string()))
                    .child(Segment::Key(key.to_string()));
                visit(children, &below, depth + 1, out);
                continue;
            }
        }

        if let Some((key, children)) = child_aggs(agg) {
            visit(children, &here.child(Segment::Key(key.to_string())), depth + 1, out);
        }
    }
}

fn child_aggs(node: &Value) -> Option<(&'static str, &Map<String, Value>)> {
    AGGS_KEYS
        .into_iter()
        .find_map(|key| Some((key, node.get(key)?.as_object()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parent_then_child() {
        let query = json!({"aggs": {"byCountry": {
            "terms": {"field": "country"},
            "aggs": {"byCity": {"terms": {"field": "city"}}}
        }}});
        assert_eq!(
            find_bucket_paths(&query),
            vec!["aggs.byCountry", "aggs.byCountry.aggs.byCity"]
        );
    }

    #[test]
    fn test_all_bucket_kinds_and_siblings() {
        let query = json!({"aggs": {
            "overTime": {"date_histogram": {"field": "ts", "calendar_interval": "1d"}},
            "avgAge": {"avg": {"field": "age"}},
            "unusual": {"significant_terms": {"field": "tag"}}
        }});
        assert_eq!(
            find_bucket_paths(&query),
            vec!["aggs.overTime", "aggs.unusual"]
        );
    }

    #[test]
    fn test_children_declared_inside_kind_body() {
        let query = json!({"aggs": {"byCountry": {
            "terms": {"field": "country", "aggs": {"byCity": {"terms": {"field": "city"}}}}
        }}});
        assert_eq!(
            find_bucket_paths(&query),
            vec!["aggs.byCountry", "aggs.byCountry.terms.aggs.byCity"]
        );
    }

    #[test]
    fn test_descends_through_nested_wrapper() {
        let query = json!({"aggregations": {"items": {
            "nested": {"path": "items"},
            "aggs": {"byName": {"terms": {"field": "items.name"}}}
        }}});
        assert_eq!(
            find_bucket_paths(&query),
            vec!["aggregations.items.aggs.byName"]
        );
    }

    #[test]
    fn test_no_aggs() {
        assert!(find_bucket_paths(&json!({"query": {"match_all": {}}})).is_empty());
        assert!(find_bucket_paths(&json!({"aggs": []})).is_empty());
    }

    #[test]
    fn test_dotted_names_are_escaped() {
        let query = json!({"aggs": {"by.host": {"terms": {"field": "host"}}}});
        assert_eq!(find_bucket_paths(&query), vec![r"aggs.by\.host"]);
    }
}

//! Property-based tests for the walker, reorderer and nested merger.
//!
//! Uses `proptest` to generate bucket trees, row sets and clause lists and
//! checks the structural guarantees each transformation makes.

use esmap::key::{normalize_key, REMOVE_MARK};
use esmap::query::merge_nested_filters_lossy;
use esmap::{reorder, walk, MappingOptions, OrderLevel};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn label_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(REMOVE_MARK.to_string()),
        Just(" - ".to_string()),
        Just("{{{REM".to_string()),
        Just("OVE}}}".to_string()),
        "[a-zA-Z ]{1,4}",
    ]
}

fn keyed_buckets() -> impl Strategy<Value = BTreeMap<String, u32>> {
    prop::collection::btree_map("[a-z]{1,8}", 0u32..1000, 0..12)
}

fn bucket_array() -> impl Strategy<Value = Vec<(String, u32)>> {
    prop::collection::vec(("[A-Z]{2}", 0u32..1000), 0..12)
}

fn child_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..8)
}

fn row() -> impl Strategy<Value = Value> {
    (
        prop::sample::select(vec!["north", "south", "east", "west"]),
        prop::sample::select(vec!["a", "b", "c"]),
    )
        .prop_map(|(region, city)| json!({"region": region, "city": city}))
}

fn clause_entry() -> impl Strategy<Value = Value> {
    prop_oneof![
        (prop::sample::select(vec!["items", "tags", "notes"]), 0u32..5)
            .prop_map(|(path, n)| {
                let mut term = Map::new();
                term.insert(format!("{path}.f"), json!(n));
                json!({"nested": {"path": path, "query": {"term": term}}})
            }),
        (0u32..5).prop_map(|n| json!({"term": {"plain": n}})),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn response(aggs: Value) -> Value {
    json!({"aggregations": aggs})
}

fn nested_paths(list: &Value) -> Vec<String> {
    list.as_array()
        .into_iter()
        .flatten()
        .filter_map(|e| e["nested"]["path"].as_str().map(str::to_string))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // -----------------------------------------------------------------------
    // Key normalization
    // -----------------------------------------------------------------------

    #[test]
    fn normalize_is_idempotent(parts in prop::collection::vec(label_fragment(), 0..10)) {
        let raw = parts.concat();
        let once = normalize_key(&raw);
        prop_assert_eq!(normalize_key(&once), once);
    }

    // -----------------------------------------------------------------------
    // Bucket counts
    // -----------------------------------------------------------------------

    #[test]
    fn keyed_buckets_one_datum_per_property(buckets in keyed_buckets()) {
        let container: Map<String, Value> = buckets
            .iter()
            .map(|(k, n)| (k.clone(), json!({"doc_count": n})))
            .collect();
        let resp = response(json!({"status": {"buckets": container}}));

        let mapped = walk(&resp, MappingOptions::default());
        prop_assert_eq!(mapped.data.len(), buckets.len());
        for (datum, (key, count)) in mapped.data.iter().zip(&buckets) {
            prop_assert_eq!(&datum["key"], &json!(key));
            prop_assert_eq!(&datum["value"], &json!(count));
        }
    }

    #[test]
    fn bucket_array_one_datum_per_element(buckets in bucket_array()) {
        let items: Vec<Value> = buckets
            .iter()
            .map(|(k, n)| json!({"key": k, "doc_count": n}))
            .collect();
        let resp = response(json!({"byCountry": {"buckets": items}}));

        let mapped = walk(&resp, MappingOptions { multi_series: true, ..Default::default() });
        prop_assert_eq!(mapped.data.len(), buckets.len());
    }

    // -----------------------------------------------------------------------
    // Stacking / direct doc count
    // -----------------------------------------------------------------------

    #[test]
    fn stacking_replaces_data_and_value(names in child_names()) {
        let children: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"key": format!("City {name}"), "doc_count": i}))
            .collect();
        let resp = response(json!({"byCountry": {"buckets": [
            {"key": "US", "doc_count": 100, "byCity": {"buckets": children}}
        ]}}));

        let mapped = walk(&resp, MappingOptions { stacked: true, ..Default::default() });
        let parent = &mapped.data[0];
        prop_assert!(!parent.contains_key("data"));
        prop_assert!(!parent.contains_key("value"));
        prop_assert_eq!(parent.len(), names.len() + 1);
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(&parent[&format!("city_{name}")], &json!(i));
        }
    }

    #[test]
    fn direct_doc_count_never_emits_data(
        outer in bucket_array(),
        inner in bucket_array(),
        flat in any::<bool>(),
    ) {
        let children: Vec<Value> = inner
            .iter()
            .map(|(k, n)| json!({"key": k, "doc_count": n}))
            .collect();
        let items: Vec<Value> = outer
            .iter()
            .map(|(k, n)| json!({
                "key": k,
                "doc_count": n,
                "active": {"doc_count": n / 2},
                "byCity": {"buckets": children.clone()}
            }))
            .collect();
        let resp = response(json!({"byCountry": {"buckets": items}}));

        let options = MappingOptions { direct_doc_count: true, flat, ..Default::default() };
        for datum in walk(&resp, options).data {
            prop_assert!(!datum.contains_key("data"));
        }
    }

    // -----------------------------------------------------------------------
    // Two-level reordering
    // -----------------------------------------------------------------------

    #[test]
    fn two_level_reorder_drops_unlisted_and_groups(
        rows in prop::collection::vec(row(), 0..20),
        primary in prop::sample::subsequence(vec!["north", "south", "east", "west"], 0..=4),
    ) {
        let doc = json!({"series": [{"rows": rows.clone()}]});
        let levels = [
            OrderLevel::new("region", primary.clone()),
            OrderLevel::new("city", ["c", "b", "a"]),
        ];
        let out = reorder(&doc, "series.#.rows", &levels).unwrap();
        let sorted = out["series"][0]["rows"].as_array().unwrap();

        let listed = rows
            .iter()
            .filter(|r| primary.iter().any(|p| Some(*p) == r["region"].as_str()))
            .count();
        prop_assert_eq!(sorted.len(), listed);

        let ranks: Vec<usize> = sorted
            .iter()
            .map(|r| {
                let region = r["region"].as_str().unwrap();
                primary.iter().position(|p| *p == region).unwrap()
            })
            .collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    // -----------------------------------------------------------------------
    // Nested merge convergence
    // -----------------------------------------------------------------------

    #[test]
    fn merging_twice_converges(
        filter in prop::collection::vec(clause_entry(), 0..8),
        must in prop::collection::vec(clause_entry(), 0..8),
    ) {
        let query = json!({"query": {"bool": {"filter": filter, "must": must}}});
        let once = merge_nested_filters_lossy(&query);
        let twice = merge_nested_filters_lossy(&once);
        prop_assert_eq!(&once, &twice);

        for kind in ["filter", "must"] {
            let before: BTreeSet<String> =
                nested_paths(&query["query"]["bool"][kind]).into_iter().collect();
            let after = nested_paths(&twice["query"]["bool"][kind]);
            prop_assert_eq!(after.len(), before.len());
            prop_assert_eq!(after.into_iter().collect::<BTreeSet<_>>(), before);
        }
    }
}

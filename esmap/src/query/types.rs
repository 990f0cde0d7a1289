//! Query DSL fragments recognized by the rewriters

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Boolean clause lists scanned for nested queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Filter,
    Must,
    MustNot,
}

impl ClauseKind {
    pub const ALL: [ClauseKind; 3] = [ClauseKind::Filter, ClauseKind::Must, ClauseKind::MustNot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Must => "must",
            Self::MustNot => "must_not",
        }
    }

    /// Dot path of this clause list in a search request body
    pub fn list_path(&self) -> String {
        format!("query.bool.{}", self.as_str())
    }
}

/// Aggregation kinds that produce buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketAggKind {
    Terms,
    SignificantTerms,
    DateHistogram,
}

impl BucketAggKind {
    pub const ALL: [BucketAggKind; 3] = [
        BucketAggKind::Terms,
        BucketAggKind::SignificantTerms,
        BucketAggKind::DateHistogram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terms => "terms",
            Self::SignificantTerms => "significant_terms",
            Self::DateHistogram => "date_histogram",
        }
    }

    /// The bucketing kind declared in an aggregation body, if any
    pub fn of(agg: &Value) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| agg.get(kind.as_str()).is_some())
    }
}

/// `{"nested": {...}}` query clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedClause {
    pub nested: NestedQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedQuery {
    pub path: String,
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<Value>,
}

impl NestedClause {
    /// Single nested clause requiring every query in `queries`, with inner hits
    pub fn merged(path: String, queries: Vec<Value>) -> Self {
        Self {
            nested: NestedQuery {
                path,
                query: json!({"bool": {"must": queries}}),
                inner_hits: Some(json!({})),
            },
        }
    }
}

/// The `must` list of a query that is nothing but `{"bool": {"must": [...]}}`
pub fn bare_must_list(query: &Value) -> Option<&Vec<Value>> {
    let outer = query.as_object().filter(|m| m.len() == 1)?;
    let bool_query = outer.get("bool")?.as_object().filter(|m| m.len() == 1)?;
    bool_query.get("must")?.as_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_kind_paths() {
        assert_eq!(ClauseKind::MustNot.list_path(), "query.bool.must_not");
        assert_eq!(
            serde_json::to_value(ClauseKind::MustNot).unwrap(),
            json!("must_not")
        );
    }

    #[test]
    fn test_bucket_agg_kind_of() {
        assert_eq!(
            BucketAggKind::of(&json!({"date_histogram": {"field": "ts"}})),
            Some(BucketAggKind::DateHistogram)
        );
        assert_eq!(BucketAggKind::of(&json!({"avg": {"field": "age"}})), None);
    }

    #[test]
    fn test_merged_clause_serialization() {
        let clause = NestedClause::merged("items".to_string(), vec![json!({"term": {"a": 1}})]);
        assert_eq!(
            serde_json::to_value(&clause).unwrap(),
            json!({"nested": {
                "path": "items",
                "query": {"bool": {"must": [{"term": {"a": 1}}]}},
                "inner_hits": {}
            }})
        );
    }

    #[test]
    fn test_bare_must_list() {
        let bare = json!({"bool": {"must": [1, 2]}});
        assert_eq!(bare_must_list(&bare), Some(&vec![json!(1), json!(2)]));

        let with_should = json!({"bool": {"must": [1], "should": [2]}});
        assert!(bare_must_list(&with_should).is_none());

        let boosted = json!({"bool": {"must": [1]}, "boost": 2.0});
        assert!(bare_must_list(&boosted).is_none());
    }
}

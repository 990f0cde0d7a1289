//! Merging of nested clauses that target the same nested path
//!
//! Elasticsearch evaluates each `nested` clause against its own set of
//! nested documents, so two clauses on `items` can be satisfied by two
//! different items. Merging them into one `nested` clause with a `bool.must`
//! makes every condition apply to the same nested document.

use crate::error::EsMapError;
use crate::path::{self, lookup, DocPath};
use crate::query::types::{bare_must_list, ClauseKind, NestedClause};
use serde_json::Value;
use tracing::{debug, warn};

/// Outcome of a merge. Steps that failed are listed in `failures`; the
/// document reflects every step that succeeded.
#[derive(Debug)]
pub struct Merged {
    pub document: Value,
    pub failures: Vec<EsMapError>,
}

impl Merged {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Merge nested clauses sharing a path within each of `filter`, `must` and
/// `must_not`. Merged clauses are appended to their list and request inner hits.
pub fn merge_nested_filters(query: &Value) -> Merged {
    let mut document = query.clone();
    let mut failures = Vec::new();

    for kind in ClauseKind::ALL {
        merge_clause_kind(&mut document, kind, &mut failures);
    }

    Merged { document, failures }
}

/// [`merge_nested_filters`], discarding failure details
pub fn merge_nested_filters_lossy(query: &Value) -> Value {
    merge_nested_filters(query).document
}

/// Inner queries collected per nested path, in first-seen order
#[derive(Default)]
struct NestedGroups {
    groups: Vec<(String, Vec<Value>)>,
}

impl NestedGroups {
    fn collect(&mut self, nested_path: &str, query: Option<&Value>) {
        let index = match self.groups.iter().position(|(p, _)| p == nested_path) {
            Some(i) => i,
            None => {
                self.groups.push((nested_path.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };
        let queries = &mut self.groups[index].1;

        match query {
            Some(Value::Array(items)) => queries.extend(items.iter().cloned()),
            Some(q @ Value::Object(_)) => match bare_must_list(q) {
                // already merged: keep the list flat so re-merging converges
                Some(must) => queries.extend(must.iter().cloned()),
                None => queries.push(q.clone()),
            },
            _ => {}
        }
    }
}

fn merge_clause_kind(doc: &mut Value, kind: ClauseKind, failures: &mut Vec<EsMapError>) {
    let list_path = kind.list_path();

    let mut groups = NestedGroups::default();
    let mut recorded = Vec::new();
    match lookup(doc, &list_path) {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.iter().enumerate() {
                let Some(nested_path) = lookup(entry, "nested.path") else {
                    continue;
                };
                recorded.push(i);
                groups.collect(
                    nested_path.as_str().unwrap_or_default(),
                    lookup(entry, "nested.query"),
                );
            }
        }
        _ => return,
    }

    if recorded.is_empty() {
        return;
    }

    // Highest index first so earlier removals never shift later ones
    for i in recorded.iter().rev() {
        let removed = DocPath::parse(&format!("{list_path}.{i}"))
            .map(|p| p.escape_indices())
            .and_then(|p| path::delete(doc, &p));
        if let Err(e) = removed {
            warn!(clause = kind.as_str(), index = i, "Failed to remove nested clause: {}", e);
            failures.push(e);
        }
    }

    let append = match DocPath::parse(&format!("{list_path}.-1")) {
        Ok(p) => p,
        Err(e) => {
            failures.push(e);
            return;
        }
    };

    let mut merged = 0;
    for (nested_path, queries) in groups.groups {
        if queries.is_empty() {
            continue;
        }
        let appended = serde_json::to_value(NestedClause::merged(nested_path.clone(), queries))
            .map_err(EsMapError::from)
            .and_then(|clause| path::set(doc, &append, clause));
        match appended {
            Ok(()) => merged += 1,
            Err(e) => {
                warn!(
                    clause = kind.as_str(),
                    nested_path = %nested_path,
                    "Failed to append merged nested clause: {}",
                    e
                );
                failures.push(e);
            }
        }
    }

    debug!(
        clause = kind.as_str(),
        removed = recorded.len(),
        merged,
        "Merged nested clauses"
    );
}

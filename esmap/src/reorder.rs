//! Custom ordering of result arrays
//!
//! Rows are ranked by the position of a key's value in a caller-supplied
//! list. With two levels, rows are grouped by the first key, groups are
//! emitted in the first list's order and each group is ordered by the second.

use crate::error::EsMapError;
use crate::path::{self, DocPath};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// One ordering level: the row key to read and the explicit order of its values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLevel {
    /// Path of the ordering value inside each row
    pub key: String,
    pub order: Vec<String>,
}

impl OrderLevel {
    pub fn new<I, S>(key: impl Into<String>, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

/// Return a copy of `document` with the array(s) at `target_path` reordered.
///
/// A `#` in `target_path` reorders every matched array independently.
/// Without `#` the first row of the target array is a placeholder and keeps
/// its position. With two levels, rows whose first-level value is not listed
/// are dropped.
pub fn reorder(document: &Value, target_path: &str, levels: &[OrderLevel]) -> Result<Value> {
    if levels.is_empty() || levels.len() > 2 {
        return Err(EsMapError::InvalidOrdering(format!(
            "expected 1 or 2 ordering levels, got {}",
            levels.len()
        )));
    }

    let target = DocPath::parse(target_path)?;
    let keys = levels
        .iter()
        .map(|level| DocPath::parse(&level.key))
        .collect::<Result<Vec<_>>>()?;

    let mut out = document.clone();

    if target.has_each() {
        let sorted: Vec<(DocPath, Vec<Value>)> = path::select(document, &target)
            .into_iter()
            .filter_map(|(at, found)| {
                let rows = found.as_array()?.clone();
                Some((at, sort_rows(rows, levels, &keys)))
            })
            .collect();

        debug!(target = %target, arrays = sorted.len(), "Reordering matched arrays");
        for (at, rows) in sorted {
            path::set(&mut out, &at, Value::Array(rows))?;
        }
    } else {
        let (at, found) = path::select(document, &target)
            .into_iter()
            .next()
            .ok_or_else(|| EsMapError::PathNotFound(target_path.to_string()))?;
        let items = found
            .as_array()
            .ok_or_else(|| EsMapError::NotAnArray(target_path.to_string()))?;

        let rows = match items.split_first() {
            Some((head, tail)) => std::iter::once(head.clone())
                .chain(sort_rows(tail.to_vec(), levels, &keys))
                .collect(),
            None => Vec::new(),
        };
        path::set(&mut out, &at, Value::Array(rows))?;
    }

    Ok(out)
}

fn sort_rows(mut rows: Vec<Value>, levels: &[OrderLevel], keys: &[DocPath]) -> Vec<Value> {
    match (levels, keys) {
        ([only], [key]) => {
            rows.sort_by_cached_key(|row| rank(&only.order, row, key));
            rows
        }
        ([primary, secondary], [primary_key, secondary_key]) => {
            let mut groups: HashMap<String, Vec<Value>> = HashMap::new();
            for row in rows {
                groups
                    .entry(sort_token(path::get(&row, primary_key)))
                    .or_default()
                    .push(row);
            }

            let mut out = Vec::new();
            for name in &primary.order {
                if let Some(mut group) = groups.remove(name) {
                    group.sort_by_cached_key(|row| rank(&secondary.order, row, secondary_key));
                    out.extend(group);
                }
            }

            let dropped: usize = groups.values().map(Vec::len).sum();
            if dropped > 0 {
                debug!(dropped, "Rows outside the primary order were dropped");
            }
            out
        }
        _ => rows,
    }
}

/// Position in `order`, or -1 so unlisted values sort first
fn rank(order: &[String], row: &Value, key: &DocPath) -> isize {
    let token = sort_token(path::get(row, key));
    order
        .iter()
        .position(|o| *o == token)
        .map_or(-1, |i| i as isize)
}

fn sort_token(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

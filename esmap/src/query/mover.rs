//! Moving subtrees between paths of a query document

use crate::error::EsMapError;
use crate::path::{self, DocPath};
use crate::Result;
use serde_json::Value;
use tracing::warn;

/// Copy of `document` with the value at `from_path` moved to `to_path`.
///
/// Fails when `from_path` is absent or either path cannot be written or
/// removed. The caller's document is never modified.
pub fn move_node(document: &Value, to_path: &str, from_path: &str) -> Result<Value> {
    let moved = try_move(document, to_path, from_path);
    if let Err(e) = &moved {
        warn!(from = from_path, to = to_path, kind = e.kind(), "Query move failed: {}", e);
    }
    moved
}

fn try_move(document: &Value, to_path: &str, from_path: &str) -> Result<Value> {
    let from = DocPath::parse(from_path)?;
    let to = DocPath::parse(to_path)?;

    let value = path::get(document, &from)
        .cloned()
        .ok_or_else(|| EsMapError::PathNotFound(from_path.to_string()))?;

    let mut out = document.clone();
    path::set(&mut out, &to, value)?;
    path::delete(&mut out, &from)?;
    Ok(out)
}

//! Dot/wildcard path expressions over JSON documents
//!
//! Paths are dot-separated segments:
//!
//! - `name` - object member (`\.` escapes a literal dot)
//! - `3` - array element 3, or object member `"3"` on an object
//! - `:3` - array element 3 only, never an object member
//! - `*` - first child whose subtree matches the rest of the path
//! - `#` - every element of an array (only meaningful for [`select`])
//! - `-1` - append to an array (only meaningful for [`set`])

use crate::error::EsMapError;
use crate::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    /// Bare digits: index on arrays, member name on objects
    Numeric(String),
    Index(usize),
    Wildcard,
    Each,
    Append,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(EsMapError::InvalidPath("empty path segment".to_string()));
        }
        let seg = match raw {
            "*" => Segment::Wildcard,
            "#" => Segment::Each,
            "-1" => Segment::Append,
            _ if raw.bytes().all(|b| b.is_ascii_digit()) => Segment::Numeric(raw.to_string()),
            _ => match raw.strip_prefix(':') {
                Some(digits)
                    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
                {
                    let index = digits
                        .parse()
                        .map_err(|_| EsMapError::InvalidPath(format!("index too large: {raw}")))?;
                    Segment::Index(index)
                }
                _ => Segment::Key(raw.to_string()),
            },
        };
        Ok(seg)
    }

    fn is_concrete(&self) -> bool {
        !matches!(self, Segment::Wildcard | Segment::Each)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k.replace('.', "\\.")),
            Segment::Numeric(raw) => write!(f, "{raw}"),
            Segment::Index(i) => write!(f, ":{i}"),
            Segment::Wildcard => write!(f, "*"),
            Segment::Each => write!(f, "#"),
            Segment::Append => write!(f, "-1"),
        }
    }
}

/// A parsed document path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocPath {
    segments: Vec<Segment>,
}

impl DocPath {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(EsMapError::InvalidPath("empty path".to_string()));
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('.') => current.push('.'),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                },
                '.' => segments.push(Segment::parse(&std::mem::take(&mut current))?),
                _ => current.push(c),
            }
        }
        segments.push(Segment::parse(&current)?);

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// True when the path contains no `*` or `#` segment
    pub fn is_concrete(&self) -> bool {
        self.segments.iter().all(Segment::is_concrete)
    }

    /// True when the path addresses a collection through `#`
    pub fn has_each(&self) -> bool {
        self.segments.contains(&Segment::Each)
    }

    /// Rewrite bare numeric segments into explicit `:N` index segments
    pub fn escape_indices(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|seg| match seg {
                Segment::Numeric(raw) => raw
                    .parse()
                    .map(Segment::Index)
                    .unwrap_or_else(|_| seg.clone()),
                _ => seg.clone(),
            })
            .collect();
        Self { segments }
    }
}

impl FromStr for DocPath {
    type Err = EsMapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// First value matching `path`, or `None`
pub fn get<'a>(doc: &'a Value, path: &DocPath) -> Option<&'a Value> {
    lookup_segments(doc, &path.segments)
}

/// Parse and look up in one step. Invalid paths read as absent.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let path = DocPath::parse(path).ok()?;
    get(doc, &path)
}

fn lookup_segments<'a>(node: &'a Value, segs: &[Segment]) -> Option<&'a Value> {
    let Some((head, rest)) = segs.split_first() else {
        return Some(node);
    };

    match head {
        Segment::Key(k) => node.as_object()?.get(k).and_then(|c| lookup_segments(c, rest)),
        Segment::Numeric(raw) => match node {
            Value::Array(items) => raw
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .and_then(|c| lookup_segments(c, rest)),
            Value::Object(map) => map.get(raw).and_then(|c| lookup_segments(c, rest)),
            _ => None,
        },
        Segment::Index(i) => node
            .as_array()?
            .get(*i)
            .and_then(|c| lookup_segments(c, rest)),
        Segment::Wildcard => children(node).find_map(|(_, c)| lookup_segments(c, rest)),
        Segment::Each | Segment::Append => None,
    }
}

/// Every value matching `path`, each with its concrete path.
///
/// `#` fans out over all array elements; `*` still picks the first child
/// whose subtree yields at least one match.
pub fn select<'a>(doc: &'a Value, path: &DocPath) -> Vec<(DocPath, &'a Value)> {
    let mut out = Vec::new();
    select_segments(doc, &path.segments, DocPath::default(), &mut out);
    out
}

fn select_segments<'a>(
    node: &'a Value,
    segs: &[Segment],
    at: DocPath,
    out: &mut Vec<(DocPath, &'a Value)>,
) {
    let Some((head, rest)) = segs.split_first() else {
        out.push((at, node));
        return;
    };

    match head {
        Segment::Key(k) => {
            if let Some(child) = node.as_object().and_then(|m| m.get(k)) {
                select_segments(child, rest, at.child(Segment::Key(k.clone())), out);
            }
        }
        Segment::Numeric(raw) => match node {
            Value::Array(items) => {
                let found = raw
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| Some((i, items.get(i)?)));
                if let Some((i, child)) = found {
                    select_segments(child, rest, at.child(Segment::Index(i)), out);
                }
            }
            Value::Object(map) => {
                if let Some(child) = map.get(raw) {
                    select_segments(child, rest, at.child(Segment::Key(raw.clone())), out);
                }
            }
            _ => {}
        },
        Segment::Index(i) => {
            if let Some(child) = node.as_array().and_then(|items| items.get(*i)) {
                select_segments(child, rest, at.child(Segment::Index(*i)), out);
            }
        }
        Segment::Wildcard => {
            for (seg, child) in children(node) {
                let before = out.len();
                select_segments(child, rest, at.child(seg), out);
                if out.len() > before {
                    break;
                }
            }
        }
        Segment::Each => {
            if let Value::Array(items) = node {
                for (i, child) in items.iter().enumerate() {
                    select_segments(child, rest, at.child(Segment::Index(i)), out);
                }
            }
        }
        Segment::Append => {}
    }
}

fn children(node: &Value) -> Box<dyn Iterator<Item = (Segment, &Value)> + '_> {
    match node {
        Value::Object(map) => Box::new(map.iter().map(|(k, v)| (Segment::Key(k.clone()), v))),
        Value::Array(items) => Box::new(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (Segment::Index(i), v)),
        ),
        _ => Box::new(std::iter::empty()),
    }
}

/// Write `value` at `path`, creating intermediate objects as needed
pub fn set(doc: &mut Value, path: &DocPath, value: Value) -> Result<()> {
    if !path.is_concrete() {
        return Err(EsMapError::InvalidPath(format!(
            "wildcards cannot be written: {path}"
        )));
    }

    let mut node = doc;
    for (depth, seg) in path.segments.iter().enumerate() {
        node = slot_mut(node, seg, path, depth)?;
    }
    *node = value;
    Ok(())
}

fn slot_mut<'a>(
    node: &'a mut Value,
    seg: &Segment,
    path: &DocPath,
    depth: usize,
) -> Result<&'a mut Value> {
    let here = || DocPath {
        segments: path.segments[..=depth].to_vec(),
    };

    if node.is_null() {
        *node = match seg {
            Segment::Index(_) | Segment::Append => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        };
    }

    match (seg, node) {
        (Segment::Key(k), Value::Object(map)) | (Segment::Numeric(k), Value::Object(map)) => {
            Ok(map.entry(k.clone()).or_insert(Value::Null))
        }
        (Segment::Numeric(raw), Value::Array(items)) => {
            let index = raw
                .parse::<usize>()
                .map_err(|_| EsMapError::InvalidPath(here().to_string()))?;
            array_slot(items, index, here)
        }
        (Segment::Index(index), Value::Array(items)) => array_slot(items, *index, here),
        (Segment::Append, Value::Array(items)) => {
            items.push(Value::Null);
            let last = items.len() - 1;
            Ok(&mut items[last])
        }
        (Segment::Wildcard | Segment::Each, _) => Err(EsMapError::InvalidPath(path.to_string())),
        (Segment::Key(_), Value::Array(_))
        | (Segment::Index(_) | Segment::Append, Value::Object(_)) => {
            Err(EsMapError::InvalidPath(here().to_string()))
        }
        _ => Err(EsMapError::NotAContainer(here().to_string())),
    }
}

fn array_slot<'a>(
    items: &'a mut Vec<Value>,
    index: usize,
    here: impl Fn() -> DocPath,
) -> Result<&'a mut Value> {
    if index == items.len() {
        items.push(Value::Null);
    }
    items.get_mut(index).ok_or_else(|| EsMapError::IndexOutOfBounds {
        path: here().to_string(),
        index,
    })
}

/// Remove and return the value at `path`
pub fn delete(doc: &mut Value, path: &DocPath) -> Result<Value> {
    if !path.is_concrete() {
        return Err(EsMapError::InvalidPath(format!(
            "wildcards cannot be deleted: {path}"
        )));
    }
    let not_found = || EsMapError::PathNotFound(path.to_string());

    let (last, parents) = path.segments.split_last().ok_or_else(not_found)?;
    let mut node = doc;
    for seg in parents {
        node = descend_mut(node, seg).ok_or_else(not_found)?;
    }

    match (last, node) {
        (Segment::Key(k), Value::Object(map)) | (Segment::Numeric(k), Value::Object(map)) => {
            map.shift_remove(k).ok_or_else(not_found)
        }
        (Segment::Numeric(raw), Value::Array(items)) => match raw.parse::<usize>() {
            Ok(i) if i < items.len() => Ok(items.remove(i)),
            _ => Err(not_found()),
        },
        (Segment::Index(i), Value::Array(items)) if *i < items.len() => Ok(items.remove(*i)),
        _ => Err(not_found()),
    }
}

fn descend_mut<'a>(node: &'a mut Value, seg: &Segment) -> Option<&'a mut Value> {
    match (seg, node) {
        (Segment::Key(k), Value::Object(map)) | (Segment::Numeric(k), Value::Object(map)) => {
            map.get_mut(k)
        }
        (Segment::Numeric(raw), Value::Array(items)) => items.get_mut(raw.parse::<usize>().ok()?),
        (Segment::Index(i), Value::Array(items)) => items.get_mut(*i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(raw: &str) -> DocPath {
        DocPath::parse(raw).unwrap()
    }

    // ===================================================================
    // Parsing
    // ===================================================================

    #[test]
    fn test_parse_segments() {
        let path = p("aggs.*.buckets.#.:2.0.-1");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("aggs".to_string()),
                Segment::Wildcard,
                Segment::Key("buckets".to_string()),
                Segment::Each,
                Segment::Index(2),
                Segment::Numeric("0".to_string()),
                Segment::Append,
            ]
        );
    }

    #[test]
    fn test_parse_escaped_dot() {
        let path = p(r"fields.host\.name");
        assert_eq!(path.segments()[1], Segment::Key("host.name".to_string()));
        assert_eq!(path.to_string(), r"fields.host\.name");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(DocPath::parse("").is_err());
        assert!(DocPath::parse("a..b").is_err());
        assert!(DocPath::parse("a.").is_err());
    }

    #[test]
    fn test_escape_indices() {
        let escaped = p("query.bool.must.3").escape_indices();
        assert_eq!(escaped.to_string(), "query.bool.must.:3");
    }

    // ===================================================================
    // Lookup
    // ===================================================================

    #[test]
    fn test_lookup_plain_and_numeric() {
        let doc = json!({"a": {"b": [10, 20, 30]}, "m": {"7": "seven"}});
        assert_eq!(lookup(&doc, "a.b.1"), Some(&json!(20)));
        assert_eq!(lookup(&doc, "a.b.:2"), Some(&json!(30)));
        assert_eq!(lookup(&doc, "m.7"), Some(&json!("seven")));
        assert_eq!(lookup(&doc, "m.:7"), None);
        assert_eq!(lookup(&doc, "a.b.9"), None);
    }

    #[test]
    fn test_lookup_wildcard_backtracks_in_document_order() {
        let doc = json!({
            "first": {"doc_count": 3},
            "second": {"buckets": [1]},
            "third": {"buckets": [2]}
        });
        assert_eq!(lookup(&doc, "*.buckets"), Some(&json!([1])));
        assert_eq!(lookup(&doc, "*.doc_count"), Some(&json!(3)));
        assert_eq!(lookup(&doc, "*.missing"), None);
    }

    #[test]
    fn test_lookup_null_exists() {
        let doc = json!({"a": {"value": null}});
        assert_eq!(lookup(&doc, "*.value"), Some(&Value::Null));
    }

    // ===================================================================
    // Select
    // ===================================================================

    #[test]
    fn test_select_each_with_concrete_paths() {
        let doc = json!({"rows": [{"x": 1}, {"y": 2}, {"x": 3}]});
        let found = select(&doc, &p("rows.#.x"));
        let paths: Vec<String> = found.iter().map(|(path, _)| path.to_string()).collect();
        assert_eq!(paths, vec!["rows.:0.x", "rows.:2.x"]);
        assert_eq!(found[1].1, &json!(3));
    }

    #[test]
    fn test_select_wildcard_then_each() {
        let doc = json!({
            "meta": {"doc_count": 1},
            "top": {"hits": {"hits": [{"_source": {"a": 1}}, {"_source": {"a": 2}}]}}
        });
        let found = select(&doc, &p("*.hits.hits.#._source"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0.to_string(), "top.hits.hits.:0._source");
    }

    // ===================================================================
    // Set / delete
    // ===================================================================

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({});
        set(&mut doc, &p("query.bool.filter"), json!([])).unwrap();
        assert_eq!(doc, json!({"query": {"bool": {"filter": []}}}));
    }

    #[test]
    fn test_set_append_and_index() {
        let mut doc = json!({"list": [1, 2]});
        set(&mut doc, &p("list.-1"), json!(3)).unwrap();
        set(&mut doc, &p("list.0"), json!(0)).unwrap();
        set(&mut doc, &p("list.3"), json!(4)).unwrap();
        assert_eq!(doc, json!({"list": [0, 2, 3, 4]}));

        let err = set(&mut doc, &p("list.9"), json!(9)).unwrap_err();
        assert_eq!(err.kind(), "index_out_of_bounds");
    }

    #[test]
    fn test_set_rejects_wildcards_and_scalars() {
        let mut doc = json!({"a": 1});
        assert_eq!(set(&mut doc, &p("*.b"), json!(1)).unwrap_err().kind(), "invalid_path");
        assert_eq!(set(&mut doc, &p("a.b"), json!(1)).unwrap_err().kind(), "not_a_container");
    }

    #[test]
    fn test_delete_preserves_member_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(delete(&mut doc, &p("a")).unwrap(), json!(1));
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_delete_array_element() {
        let mut doc = json!({"must": ["q0", "q1", "q2"]});
        assert_eq!(delete(&mut doc, &p("must.:1")).unwrap(), json!("q1"));
        assert_eq!(doc, json!({"must": ["q0", "q2"]}));
        assert_eq!(delete(&mut doc, &p("must.5")).unwrap_err().kind(), "path_not_found");
    }
}

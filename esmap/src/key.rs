//! Bucket key normalization for generated flat labels

use serde_json::Value;

/// Placeholder written in place of numeric bucket keys.
///
/// Numeric keys (histogram buckets, epoch dates) carry no meaning as label
/// text, so they are tagged and later stripped from joined labels.
pub const REMOVE_MARK: &str = "{{{REMOVE}}}";

/// Separator between an ancestor label and a field name
pub const LABEL_SEPARATOR: &str = " - ";

/// Strip every `"{{{REMOVE}}} - "` segment from a composite label
pub fn normalize_key(raw: &str) -> String {
    let marker = format!("{REMOVE_MARK}{LABEL_SEPARATOR}");
    let mut out = raw.replace(&marker, "");
    // A removal can splice a new marker together, e.g. "{{{REM{{{REMOVE}}} - OVE}}} - "
    while out.contains(&marker) {
        out = out.replace(&marker, "");
    }
    out
}

/// Label text for a bucket key: strings as-is, numbers become [`REMOVE_MARK`]
pub fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(_) => REMOVE_MARK.to_string(),
        _ => String::new(),
    }
}

/// Join a bucket key and a field name into a normalized flat label
pub fn flat_label(key: &Value, field: &str) -> String {
    normalize_key(&format!("{}{LABEL_SEPARATOR}{field}", key_to_string(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_strips_marker() {
        assert_eq!(normalize_key("{{{REMOVE}}} - avg_price"), "avg_price");
        assert_eq!(normalize_key("US - {{{REMOVE}}} - count"), "US - count");
        assert_eq!(normalize_key("US - count"), "US - count");
        assert_eq!(normalize_key("{{{REMOVE}}}"), "{{{REMOVE}}}");
    }

    #[test]
    fn test_normalize_spliced_marker() {
        let spliced = "{{{REM{{{REMOVE}}} - OVE}}} - x";
        assert_eq!(normalize_key(spliced), "x");
    }

    #[test]
    fn test_key_to_string() {
        assert_eq!(key_to_string(&json!("Oslo")), "Oslo");
        assert_eq!(key_to_string(&json!(1_700_000_000_000_i64)), REMOVE_MARK);
        assert_eq!(key_to_string(&json!(2.5)), REMOVE_MARK);
        assert_eq!(key_to_string(&json!(null)), "");
        assert_eq!(key_to_string(&json!(true)), "");
    }

    #[test]
    fn test_flat_label() {
        assert_eq!(flat_label(&json!("US"), "avgAge"), "US - avgAge");
        assert_eq!(flat_label(&json!(42), "avgAge"), "avgAge");
    }
}

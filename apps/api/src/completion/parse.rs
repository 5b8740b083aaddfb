//! Parsing boundary between free-text completion replies and typed results.
//!
//! Replies are not guaranteed to contain only JSON — preambles and
//! postambles are common — so every operation funnels through
//! [`extract_json_object`], which pulls out the first balanced `{...}`
//! region and nothing else. No heuristic field recovery happens beyond that
//! single extraction step.

use serde_json::Value;

use crate::completion::CompletionError;

/// Extracts and parses the first balanced `{...}` region of `text`.
///
/// The scan is string-aware: braces inside JSON string literals (including
/// escaped quotes) do not affect nesting depth. If no balanced region
/// exists, or the region is not valid JSON, the error carries the raw text
/// for diagnostics.
pub fn extract_json_object(text: &str) -> Result<Value, CompletionError> {
    let region = first_balanced_object(text).ok_or_else(|| CompletionError::parse(text))?;
    serde_json::from_str(region).map_err(|_| CompletionError::parse(text))
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if start.is_some() => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Clamps an upstream-supplied score into the documented 0–100 range.
pub fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// String field with the documented default (empty) when missing or not a
/// string.
pub fn string_field(object: &Value, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// String-array field with the documented default (empty) when missing.
/// Non-string elements are skipped rather than failing the whole reply.
pub fn string_array(object: &Value, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn number_field(object: &Value, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_bare_object() {
        let value = extract_json_object(r#"{"score": 88}"#).unwrap();
        assert_eq!(value, json!({"score": 88}));
    }

    #[test]
    fn test_extracts_object_with_preamble_and_postamble() {
        let text = "Sure! Here is the analysis:\n{\"score\": 42}\nLet me know if you need more.";
        assert_eq!(extract_json_object(text).unwrap(), json!({"score": 42}));
    }

    #[test]
    fn test_extracts_nested_object_fully() {
        let text = r#"prefix {"outer": {"inner": [1, 2]}} suffix"#;
        assert_eq!(
            extract_json_object(text).unwrap(),
            json!({"outer": {"inner": [1, 2]}})
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_region() {
        let text = r#"{"note": "uses {braces} inside", "ok": true}"#;
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["ok"], json!(true));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"note": "a \" quote } here", "ok": 1}"#;
        assert_eq!(extract_json_object(text).unwrap()["ok"], json!(1));
    }

    #[test]
    fn test_no_object_raises_parse_error() {
        let err = extract_json_object("no json to be found here").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_unbalanced_object_raises_parse_error() {
        assert!(extract_json_object(r#"{"score": 1"#).is_err());
    }

    #[test]
    fn test_invalid_json_in_region_raises_parse_error() {
        // Balanced but not JSON. No second region is attempted.
        let err = extract_json_object("{not valid} {\"ok\": 1}").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_error_carries_raw_text() {
        let err = extract_json_object("the service said nothing useful").unwrap_err();
        assert!(err.to_string().contains("nothing useful"));
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(0.0), 0);
        assert_eq!(clamp_score(87.4), 87);
        assert_eq!(clamp_score(100.0), 100);
        assert_eq!(clamp_score(250.0), 100);
    }

    #[test]
    fn test_field_helpers_default_when_missing() {
        let object = json!({"present": "x", "list": ["a", 1, "b"]});
        assert_eq!(string_field(&object, "present"), "x");
        assert_eq!(string_field(&object, "absent"), "");
        assert_eq!(string_array(&object, "list"), vec!["a", "b"]);
        assert!(string_array(&object, "absent").is_empty());
        assert_eq!(number_field(&object, "absent"), None);
    }
}

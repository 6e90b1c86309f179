//! Response extraction: recovers a JSON value from free-form model text.
//!
//! Models wrap JSON in markdown fences, prefix it with prose, or trail it with
//! commentary. Every caller that expects structured output goes through
//! `extract_json`, so question and evaluation parsing share one set of rules:
//!
//! 1. the trimmed text parsed as-is
//! 2. the first fenced code block, minus a leading `json` tag
//! 3. the widest bracketed span of the expected shape (first opener to last closer)
//!
//! The first candidate that parses to a value of the expected shape wins.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "```";

/// Top-level JSON shape a caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            JsonShape::Array => ('[', ']'),
            JsonShape::Object => ('{', '}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonShape::Array => value.is_array(),
            JsonShape::Object => value.is_object(),
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonShape::Array => f.write_str("array"),
            JsonShape::Object => f.write_str("object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No parseable JSON {shape} found in model response")]
pub struct ExtractionFailed {
    pub shape: JsonShape,
}

/// Extracts a JSON value of the given shape from raw model output.
pub fn extract_json(raw: &str, shape: JsonShape) -> Result<Value, ExtractionFailed> {
    let text = raw.trim();

    [Some(text), fenced_segment(text), bracketed_span(text, shape)]
        .into_iter()
        .flatten()
        .find_map(|candidate| parse_as(candidate, shape))
        .ok_or(ExtractionFailed { shape })
}

/// `extract_json` in array mode, unwrapped.
pub fn extract_array(raw: &str) -> Result<Vec<Value>, ExtractionFailed> {
    match extract_json(raw, JsonShape::Array)? {
        Value::Array(items) => Ok(items),
        _ => Err(ExtractionFailed {
            shape: JsonShape::Array,
        }),
    }
}

/// `extract_json` in object mode, unwrapped.
pub fn extract_object(raw: &str) -> Result<Map<String, Value>, ExtractionFailed> {
    match extract_json(raw, JsonShape::Object)? {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractionFailed {
            shape: JsonShape::Object,
        }),
    }
}

fn parse_as(candidate: &str, shape: JsonShape) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(|value| shape.matches(value))
}

/// Content of the first ``` fenced block. An unclosed fence runs to the end of the text.
fn fenced_segment(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let inner = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let inner = inner.trim();

    let untagged = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    Some(untagged.trim())
}

/// Widest span from the first opening delimiter to the last closing one.
fn bracketed_span(text: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_array() {
        let value = extract_json("```json\n[1,2,3]\n```", JsonShape::Array).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_object_surrounded_by_noise() {
        let value = extract_json("noise {\"a\":1} noise", JsonShape::Object).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_plain_prose_fails() {
        let err = extract_json("not json at all", JsonShape::Object).unwrap_err();
        assert_eq!(err.shape, JsonShape::Object);
        assert!(extract_json("not json at all", JsonShape::Array).is_err());
    }

    #[test]
    fn test_direct_parse_with_whitespace() {
        let value = extract_json("  \n[\"a\", \"b\"]\n  ", JsonShape::Array).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "Here you go:\n```\n{\"overall_score\": 7}\n```\nGood luck!";
        let value = extract_json(raw, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"overall_score": 7}));
    }

    #[test]
    fn test_uppercase_tag_and_unclosed_fence() {
        let value = extract_json("```JSON\n[\"q1\", \"q2\"]", JsonShape::Array).unwrap();
        assert_eq!(value, json!(["q1", "q2"]));
    }

    #[test]
    fn test_widest_match_keeps_nested_values() {
        let raw = "Evaluation: {\"scores\": {\"a\": 1}, \"tags\": [\"x\"]} -- end";
        let value = extract_json(raw, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"scores": {"a": 1}, "tags": ["x"]}));
    }

    #[test]
    fn test_wrong_shape_is_not_accepted() {
        // A bare object cannot satisfy an array request.
        assert!(extract_json("{\"questions\": 5}", JsonShape::Array).is_err());
        // But an array embedded in the object is found by the bracket search.
        let value = extract_json("{\"questions\": [\"a\"]}", JsonShape::Array).unwrap();
        assert_eq!(value, json!(["a"]));
    }

    #[test]
    fn test_extract_array_and_object_helpers() {
        assert_eq!(extract_array("[1, 2]").unwrap().len(), 2);
        let map = extract_object("Sure! {\"k\": \"v\"}").unwrap();
        assert_eq!(map.get("k"), Some(&json!("v")));
    }

    #[test]
    fn test_closer_before_opener_is_rejected() {
        assert!(extract_json("] nothing [", JsonShape::Array).is_err());
    }
}

//! Best-effort decoding of proposal text
//!
//! External fixers often wrap their answer in prose or Markdown, or emit
//! almost-JSON. Decoding tries, in order:
//!
//! 1. the whole text as JSON
//! 2. the first fenced code block (or the text with stray fences removed)
//! 3. the span from the first `{` to the last `}`
//! 4. the span after syntax repair (single-quoted keys, bare keys, trailing commas)
//! 5. an object rebuilt from `"key": value` pairs found anywhere in the text
//!
//! If nothing works the result is an empty object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

#[allow(clippy::expect_used)]
fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex is valid")
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?s)```(?:json|JSON|javascript|js)?(.+?)```"));
static SINGLE_QUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| regex(r"'([^']*)'\s*:"));
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| regex(r"([{,])\s*([A-Za-z0-9_]+)\s*:"));
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| regex(r",\s*([}\]])"));
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r#""([^"]+)"\s*:\s*("(?:[^"\\]|\\.)*"|\[[^\]]*\]|true|false|null|-?\d+(?:\.\d+)?)"#,
    )
});
static QUOTED: LazyLock<Regex> = LazyLock::new(|| regex(r#""((?:[^"\\]|\\.)*)""#));

/// Which decoding step produced the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Strict,
    CodeFence,
    Extracted,
    Repaired,
    KeyValue,
    Empty,
}

/// Decode `text` into a JSON object
pub fn decode_object(text: &str) -> (Map<String, Value>, DecodeStrategy) {
    let text = text.trim();
    if text.is_empty() {
        return (Map::new(), DecodeStrategy::Empty);
    }

    if let Some(object) = parse_object(text) {
        return (object, DecodeStrategy::Strict);
    }

    let unfenced = strip_fences(text);
    if let Some(object) = parse_object(&unfenced) {
        return (object, DecodeStrategy::CodeFence);
    }

    let extracted = extract_braces(&unfenced);
    if let Some(object) = extracted.and_then(parse_object) {
        return (object, DecodeStrategy::Extracted);
    }

    let repaired = repair_syntax(extracted.unwrap_or(&unfenced));
    if let Some(object) = parse_object(&repaired) {
        return (object, DecodeStrategy::Repaired);
    }

    let rebuilt = rebuild_from_pairs(&unfenced);
    if !rebuilt.is_empty() {
        return (rebuilt, DecodeStrategy::KeyValue);
    }

    (Map::new(), DecodeStrategy::Empty)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn strip_fences(text: &str) -> String {
    if let Some(captures) = CODE_FENCE.captures(text) {
        return captures[1].trim().to_string();
    }

    let mut body = text;
    if body.starts_with("```") {
        body = body.find('\n').map_or("", |i| &body[i + 1..]);
    }
    if let Some(end) = body.rfind("```") {
        if body[end..].trim() == "```" {
            body = &body[..end];
        }
    }
    body.trim().to_string()
}

fn extract_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn repair_syntax(text: &str) -> String {
    let fixed = SINGLE_QUOTED_KEY.replace_all(text, "\"$1\":");
    let fixed = BARE_KEY.replace_all(&fixed, "$1\"$2\":");
    TRAILING_COMMA.replace_all(&fixed, "$1").into_owned()
}

fn rebuild_from_pairs(text: &str) -> Map<String, Value> {
    let mut object = Map::new();

    for captures in KEY_VALUE.captures_iter(text) {
        let key = captures[1].to_string();
        let raw = &captures[2];

        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| {
            if raw.starts_with('[') {
                // Salvage the quoted items of a broken array
                Value::Array(
                    QUOTED
                        .captures_iter(raw)
                        .map(|c| Value::String(c[1].to_string()))
                        .collect(),
                )
            } else {
                Value::String(raw.trim_matches('"').to_string())
            }
        });

        object.entry(key).or_insert(value);
    }

    object
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> (Map<String, Value>, DecodeStrategy) {
        decode_object(text)
    }

    #[test]
    fn test_strict_json() {
        let (object, strategy) = decode(r#"{"module_name": "A", "depends_on": []}"#);
        assert_eq!(strategy, DecodeStrategy::Strict);
        assert_eq!(object["module_name"], "A");
    }

    #[test]
    fn test_code_fence() {
        let text = "Here is the fix:\n```json\n{\"module_name\": \"A\"}\n```\nDone.";
        let (object, strategy) = decode(text);
        assert_eq!(strategy, DecodeStrategy::CodeFence);
        assert_eq!(object["module_name"], "A");
    }

    #[test]
    fn test_unterminated_fence() {
        let (object, _) = decode("```json\n{\"module_name\": \"A\"}");
        assert_eq!(object["module_name"], "A");
    }

    #[test]
    fn test_extract_braces() {
        let (object, strategy) = decode(r#"Sure! {"module_name": "A"} Hope this helps."#);
        assert_eq!(strategy, DecodeStrategy::Extracted);
        assert_eq!(object["module_name"], "A");
    }

    #[test]
    fn test_repair_syntax() {
        let (object, strategy) =
            decode("{module_name: \"A\", 'target_path': \"src/a.rs\", \"key_apis\": [\"x\",],}");
        assert_eq!(strategy, DecodeStrategy::Repaired);
        assert_eq!(object["module_name"], "A");
        assert_eq!(object["target_path"], "src/a.rs");
        assert_eq!(object["key_apis"], serde_json::json!(["x"]));
    }

    #[test]
    fn test_key_value_fallback() {
        let text = r#"module "module_name": "A" and "depends_on": ["B", "C"] then "target_path": "x" {"#;
        let (object, strategy) = decode(text);
        assert_eq!(strategy, DecodeStrategy::KeyValue);
        assert_eq!(object["module_name"], "A");
        assert_eq!(object["depends_on"], serde_json::json!(["B", "C"]));
    }

    #[test]
    fn test_gives_up_with_empty_object() {
        let (object, strategy) = decode("I could not fix this module.");
        assert!(object.is_empty());
        assert_eq!(strategy, DecodeStrategy::Empty);
        assert_eq!(decode("   ").1, DecodeStrategy::Empty);
    }

    #[test]
    fn test_non_object_json_is_not_accepted() {
        let (object, _) = decode("[1, 2, 3]");
        assert!(object.is_empty());
    }
}

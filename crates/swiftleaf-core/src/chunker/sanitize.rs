//! Coercion of segmentation replies into valid chunks.
//!
//! Replies are produced by a language model and are trusted for nothing: any
//! field may be missing, mistyped or out of range.

use crate::chunk::Chunk;
use anyhow::{Result, anyhow};
use serde_json::Value;

const GROUPS_PROPERTY: &str = "chunks";

/// Parse a raw reply into chunks; fails only when nothing usable remains.
pub fn parse_response(raw: &str) -> Result<Vec<Chunk>> {
    let parsed: Value = serde_json::from_str(raw.trim())
        .map_err(|err| anyhow!("segmentation reply is not valid JSON: {err}"))?;
    let groups = group_list(&parsed).ok_or_else(|| anyhow!("segmentation reply has no group list"))?;

    let chunks: Vec<Chunk> = groups.iter().filter_map(sanitize_group).collect();
    if chunks.is_empty() {
        return Err(anyhow!("segmentation reply contained no usable groups"));
    }
    Ok(chunks)
}

fn group_list(parsed: &Value) -> Option<&Vec<Value>> {
    match parsed {
        Value::Array(groups) => Some(groups),
        Value::Object(map) => map
            .get(GROUPS_PROPERTY)
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(Value::as_array)),
        _ => None,
    }
}

fn sanitize_group(group: &Value) -> Option<Chunk> {
    let words = validate_words(group.get("words"));
    if words.is_empty() {
        return None;
    }
    let focus_index = validate_focus_index(&words, group.get("focusIndex"));
    Some(Chunk::new(words, focus_index))
}

pub fn validate_words(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string().trim().to_string(),
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Out-of-range indices clamp to the last word; non-numbers become 0.
pub fn validate_focus_index(words: &[String], raw: Option<&Value>) -> usize {
    if words.is_empty() {
        return 0;
    }
    let last = words.len() - 1;
    let index = raw
        .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
        .unwrap_or(0);
    if index < 0 || index as u64 > last as u64 {
        last
    } else {
        index as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_reply() {
        let raw = r#"{"chunks":[{"words":["The","cat"],"focusIndex":1},{"words":["sat"],"focusIndex":0}]}"#;
        let chunks = parse_response(raw).expect("valid reply");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].words, vec!["The", "cat"]);
        assert_eq!(chunks[0].focus_index, 1);
    }

    #[test]
    fn clamps_out_of_range_focus_to_last_word() {
        let words = vec!["on".to_string(), "the".to_string(), "mat".to_string()];
        assert_eq!(validate_focus_index(&words, Some(&json!(9))), 2);
        assert_eq!(validate_focus_index(&words, Some(&json!(-1))), 2);
        assert_eq!(validate_focus_index(&words, Some(&json!(1.7))), 1);
        assert_eq!(validate_focus_index(&words, Some(&json!("2"))), 0);
        assert_eq!(validate_focus_index(&words, None), 0);
        assert_eq!(validate_focus_index(&words[..1], Some(&json!(5))), 0);
    }

    #[test]
    fn coerces_words_and_drops_empty_groups() {
        let raw = json!({
            "chunks": [
                { "words": ["  padded ", "", 42, null, true], "focusIndex": 3 },
                { "words": "not a list", "focusIndex": 0 },
                { "focusIndex": 1 },
                { "words": ["   "], "focusIndex": 0 },
                { "words": ["kept"], "extra": "ignored" }
            ],
            "note": "extra fields are tolerated"
        })
        .to_string();
        let chunks = parse_response(&raw).expect("usable groups remain");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].words, vec!["padded", "42", "true"]);
        assert_eq!(chunks[0].focus_index, 2);
        assert_eq!(chunks[1].words, vec!["kept"]);
        assert_eq!(chunks[1].focus_index, 0);
    }

    #[test]
    fn accepts_bare_array_and_renamed_property() {
        let bare = r#"[{"words":["alpha"],"focusIndex":0}]"#;
        assert_eq!(parse_response(bare).unwrap().len(), 1);

        let renamed = r#"{"groups":[{"words":["beta","gamma"],"focusIndex":1}]}"#;
        let chunks = parse_response(renamed).unwrap();
        assert_eq!(chunks[0].focus_word(), Some("gamma"));
    }

    #[test]
    fn rejects_unusable_replies() {
        assert!(parse_response("not json at all").is_err());
        assert!(parse_response(r#"{"chunks": "nope"}"#).is_err());
        assert!(parse_response(r#"{"chunks": []}"#).is_err());
        assert!(parse_response(r#"{"chunks": [{"words": []}]}"#).is_err());
        assert!(parse_response("42").is_err());
    }

    #[test]
    fn every_sanitized_chunk_has_valid_focus() {
        let raw = json!({
            "chunks": [
                { "words": ["a"], "focusIndex": 100 },
                { "words": ["b", "c"], "focusIndex": -7 },
                { "words": ["d", "e", "f"], "focusIndex": "x" },
                { "words": [1, 2], "focusIndex": 1e12 }
            ]
        })
        .to_string();
        let chunks = parse_response(&raw).unwrap();
        assert_eq!(chunks.len(), 4);
        for chunk in chunks {
            assert!(!chunk.words.is_empty());
            assert!(chunk.focus_index < chunk.words.len());
        }
    }
}

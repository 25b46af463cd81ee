//! Pulling the actor JSON out of model text.

use serde_json::Value;
use thiserror::Error;

/// Errors from turning model text into a JSON document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response is not valid JSON: {source}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response JSON is not an object")]
    NotAnObject { raw: String },
}

impl ExtractError {
    /// The text that failed to parse, for diagnostics.
    pub fn raw(&self) -> &str {
        match self {
            ExtractError::InvalidJson { raw, .. } | ExtractError::NotAnObject { raw } => raw,
        }
    }
}

/// Return the trimmed contents of the fenced code block, or the trimmed
/// text when there is none.
///
/// The block runs from the first ```` ``` ```` (an optional `json` tag is
/// dropped) to the last one, so backticks inside the JSON survive.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };

    let inner = &text[open + 3..];
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    match inner.rfind("```") {
        Some(close) => inner[..close].trim(),
        None => text,
    }
}

/// Parse model text as a JSON object, stripping a code fence when the text
/// is not JSON as it stands.
pub fn parse_actor_json(text: &str) -> Result<Value, ExtractError> {
    let trimmed = text.trim();
    let (json_text, parsed) = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => (trimmed, Ok(value)),
        Err(_) => {
            let stripped = strip_code_fence(trimmed);
            (stripped, serde_json::from_str::<Value>(stripped))
        }
    };
    tracing::debug!(raw = %json_text, "raw JSON from model");

    let value = parsed.map_err(|source| ExtractError::InvalidJson {
        raw: json_text.to_string(),
        source,
    })?;

    if !value.is_object() {
        return Err(ExtractError::NotAnObject {
            raw: json_text.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BODY: &str = r#"{"name": "Undead Clown", "items": [{"_id": "abcdefgh12345678"}]}"#;

    #[test]
    fn test_strip_json_fence() {
        let fenced = format!("```json\n{BODY}\n```");
        assert_eq!(strip_code_fence(&fenced), BODY);
    }

    #[test]
    fn test_strip_bare_fence_and_surrounding_chatter() {
        let fenced = format!("Here you go:\n```\n{BODY}\n```\nEnjoy!");
        assert_eq!(strip_code_fence(&fenced), BODY);
    }

    #[test]
    fn test_unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fence(BODY), BODY);
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let fenced = format!("```json {BODY} ```");
        let once = strip_code_fence(&fenced);
        assert_eq!(strip_code_fence(once), once);
    }

    #[test]
    fn test_fenced_and_plain_parse_to_same_document() {
        let fenced = format!("```json\n{BODY}\n```");
        let a = parse_actor_json(&fenced).unwrap();
        let b = parse_actor_json(BODY).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["name"], json!("Undead Clown"));
    }

    #[test]
    fn test_backticks_inside_strings_survive() {
        let body = r#"{"name":"Jester","system":{"details":{"biography":{"value":"Says ```json``` a lot"}}}}"#;
        let plain = parse_actor_json(body).unwrap();
        let fenced = parse_actor_json(&format!("```json\n{body}\n```")).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(
            plain["system"]["details"]["biography"]["value"],
            json!("Says ```json``` a lot")
        );
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let err = parse_actor_json("```json\n{\"name\": \"Broken\",\n```").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson { .. }));
        assert_eq!(err.raw(), "{\"name\": \"Broken\",");
    }

    #[test]
    fn test_non_object_rejected() {
        let err = parse_actor_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ExtractError::NotAnObject { .. }));
        assert_eq!(err.raw(), "[1, 2, 3]");
    }
}

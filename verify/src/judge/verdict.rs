//! Verdict parsing.
//!
//! The reply should be a bare JSON object. Models sometimes wrap it in prose
//! or code fences, so the span from the first `{` to the last `}` is tried
//! next. Anything else is an error, never a silent rejection.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::VerifyError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub verified: bool,
    pub confidence: u8,
    pub reason: String,
}

pub fn parse_verdict(content: &str) -> Result<Verdict, VerifyError> {
    let object = as_object(content.trim())
        .or_else(|| embedded_object(content))
        .ok_or_else(|| VerifyError::UnparseableVerdict(truncate(content, 200)))?;
    Ok(from_object(&object))
}

fn as_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&text[start..=end])
}

fn from_object(object: &Map<String, Value>) -> Verdict {
    // Only a literal `true` counts.
    let verified = matches!(object.get("verified"), Some(Value::Bool(true)));
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0);
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No reason provided")
        .to_string();

    Verdict {
        verified,
        confidence,
        reason,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let verdict =
            parse_verdict(r#"{"verified": true, "confidence": 85, "reason": "Real commit"}"#)
                .unwrap();
        assert_eq!(
            verdict,
            Verdict {
                verified: true,
                confidence: 85,
                reason: "Real commit".into()
            }
        );
    }

    #[test]
    fn test_object_inside_prose() {
        let content = "Sure! Here is my verdict:\n```json\n{\"verified\": false, \"confidence\": 40, \"reason\": \"Blurry\"}\n```";
        let verdict = parse_verdict(content).unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.confidence, 40);
        assert_eq!(verdict.reason, "Blurry");
    }

    #[test]
    fn test_defaults_and_strictness() {
        let verdict = parse_verdict(r#"{"verified": "true"}"#).unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.confidence, 0);
        assert_eq!(verdict.reason, "No reason provided");

        let verdict = parse_verdict(r#"{"verified": true, "confidence": 250}"#).unwrap();
        assert_eq!(verdict.confidence, 100);
    }

    #[test]
    fn test_unparseable_is_error() {
        assert!(matches!(
            parse_verdict("I think the user did it."),
            Err(VerifyError::UnparseableVerdict(_))
        ));
        assert!(matches!(
            parse_verdict("} nothing {"),
            Err(VerifyError::UnparseableVerdict(_))
        ));
        assert!(matches!(
            parse_verdict("[true, 90]"),
            Err(VerifyError::UnparseableVerdict(_))
        ));
    }
}

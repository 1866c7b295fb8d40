//! Shot-list recovery from raw backend output.
//!
//! Models often wrap the requested JSON in prose or markdown fences even
//! when asked not to. Recovery tries, in order:
//! 1. the trimmed payload as-is
//! 2. the content of the first fenced block
//! 3. the first balanced `{...}` substring that is well-formed JSON

use serde_json::Value;
use shotgen_models::{BackendCallResult, ShotListDescription};
use thiserror::Error;

/// Upper bound on `{` positions tried by the balanced scan; each try may walk
/// the rest of the text.
const MAX_SCAN_STARTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no JSON object found in backend output")]
    NoJson,

    #[error("shot list does not match the expected shape: {0}")]
    Shape(String),

    #[error("shot list contains no shots")]
    EmptyShotList,

    #[error("shot at position {index} is invalid: {reason}")]
    InvalidShot { index: usize, reason: String },
}

/// Parse the text of a backend call into a validated shot list.
pub fn parse(result: &BackendCallResult) -> Result<ShotListDescription, ParseError> {
    parse_text(&result.text)
}

pub fn parse_text(text: &str) -> Result<ShotListDescription, ParseError> {
    let value = extract_json_object(text).ok_or(ParseError::NoJson)?;
    let shot_list: ShotListDescription =
        serde_json::from_value(value).map_err(|e| ParseError::Shape(e.to_string()))?;
    validate(&shot_list)?;
    Ok(shot_list)
}

/// Locate the first JSON object in free-form model output.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Some(value) = as_object(trimmed) {
        return Some(value);
    }

    if let Some(value) = fenced_block(trimmed).and_then(as_object) {
        return Some(value);
    }

    trimmed
        .match_indices('{')
        .take(MAX_SCAN_STARTS)
        .filter_map(|(start, _)| balanced_object_at(trimmed, start))
        .find_map(as_object)
}

fn as_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Content of the first ``` fence, with any language tag stripped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body = match after.find('\n') {
        Some(newline) if !after[..newline].contains('{') => &after[newline + 1..],
        _ => after,
    };
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// The brace-balanced substring starting at `start`, ignoring braces that
/// appear inside string literals.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

fn validate(shot_list: &ShotListDescription) -> Result<(), ParseError> {
    if shot_list.shots.is_empty() {
        return Err(ParseError::EmptyShotList);
    }

    for (index, shot) in shot_list.shots.iter().enumerate() {
        let invalid = |reason: &str| ParseError::InvalidShot {
            index,
            reason: reason.to_string(),
        };

        if !shot.start_seconds.is_finite() || !shot.end_seconds.is_finite() {
            return Err(invalid("timing is not a finite number"));
        }
        if shot.start_seconds < 0.0 {
            return Err(invalid("start time is negative"));
        }
        if shot.end_seconds < shot.start_seconds {
            return Err(invalid("ends before it starts"));
        }
        if shot.camera.trim().is_empty() {
            return Err(invalid("camera description is blank"));
        }
        if shot.action.trim().is_empty() {
            return Err(invalid("action description is blank"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotgen_models::BackendKind;

    const SHOTS: &str = r#"{
        "title": "Rooftop chase",
        "shots": [
            {"shotNumber": 1, "startSeconds": 0, "endSeconds": 4, "camera": "wide, drone", "action": "courier lands a jump"},
            {"shotNumber": 2, "startSeconds": 4, "endSeconds": 8, "camera": "close-up", "action": "she glances back {panicked}"}
        ]
    }"#;

    #[test]
    fn test_bare_json() {
        let list = parse_text(SHOTS).unwrap();
        assert_eq!(list.shots.len(), 2);
        assert_eq!(list.title.as_deref(), Some("Rooftop chase"));
    }

    #[test]
    fn test_prose_wrapped_matches_bare() {
        let wrapped = format!("Sure! Here is the shot list you asked for:\n{}\nLet me know if you need changes.", SHOTS);
        assert_eq!(parse_text(&wrapped).unwrap(), parse_text(SHOTS).unwrap());
    }

    #[test]
    fn test_fenced_block() {
        let fenced = format!("```json\n{}\n```", SHOTS);
        assert_eq!(parse_text(&fenced).unwrap(), parse_text(SHOTS).unwrap());
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scan() {
        let text = format!("Notes {{draft}} follow. {}", SHOTS);
        assert_eq!(parse_text(&text).unwrap().shots.len(), 2);
    }

    #[test]
    fn test_parse_uses_call_text() {
        let call = BackendCallResult {
            text: SHOTS.to_string(),
            backend: BackendKind::Gemini,
            model: "gemini-2.5-flash".to_string(),
            latency_ms: 10,
            usage: None,
        };
        assert_eq!(parse(&call).unwrap().shots[0].shot_number, 1);
    }

    #[test]
    fn test_stray_braces_before_object() {
        let text = format!("{{{{ {{ draft {{ notes: {}", SHOTS);
        assert_eq!(parse_text(&text).unwrap().shots.len(), 2);
    }

    #[test]
    fn test_brace_flood_is_bounded() {
        let flood = "{".repeat(40_000);
        assert_eq!(parse_text(&flood), Err(ParseError::NoJson));
        assert!(extract_json_object(&format!("{}{}", flood, SHOTS)).is_none());
    }

    #[test]
    fn test_no_json() {
        assert_eq!(parse_text("I cannot help with that."), Err(ParseError::NoJson));
        assert_eq!(parse_text("{ unterminated"), Err(ParseError::NoJson));
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_text(r#"{"shots": [{"shotNumber": 1}]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Shape(_)));

        let err = parse_text(r#"{"scenes": "none"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Shape(_)));
    }

    #[test]
    fn test_empty_shots() {
        assert_eq!(parse_text(r#"{"shots": []}"#), Err(ParseError::EmptyShotList));
    }

    #[test]
    fn test_invalid_shots() {
        let negative = r#"{"shots": [{"shotNumber": 1, "startSeconds": -1, "endSeconds": 2, "camera": "wide", "action": "run"}]}"#;
        assert!(matches!(
            parse_text(negative),
            Err(ParseError::InvalidShot { index: 0, .. })
        ));

        let reversed = r#"{"shots": [
            {"shotNumber": 1, "startSeconds": 0, "endSeconds": 2, "camera": "wide", "action": "run"},
            {"shotNumber": 2, "startSeconds": 5, "endSeconds": 3, "camera": "wide", "action": "run"}
        ]}"#;
        assert!(matches!(
            parse_text(reversed),
            Err(ParseError::InvalidShot { index: 1, .. })
        ));

        let blank = r#"{"shots": [{"shotNumber": 1, "startSeconds": 0, "endSeconds": 2, "camera": "  ", "action": "run"}]}"#;
        assert!(matches!(
            parse_text(blank),
            Err(ParseError::InvalidShot { index: 0, .. })
        ));
    }
}

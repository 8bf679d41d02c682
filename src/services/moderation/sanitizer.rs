// Response Sanitizer
// Repairs common malformations in model completions before JSON parsing
//
// Repairs run as an ordered list of independent text transformations.
// Input that already parses as a JSON array is returned unchanged, so
// the repairs only ever touch malformed text.

use crate::models::ClassificationResult;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("response is not a JSON array after sanitizing: {0}")]
    Unparseable(String),
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*\n(.+?)\n\s*```").expect("fence regex"))
}

/// Repair a model completion into (hopefully) parseable JSON.
///
/// Already-valid JSON arrays pass through byte for byte. Malformed text
/// goes through, in order: code fence stripping, smart quote
/// normalization, array extraction, trailing comma removal, control
/// character cleanup and invalid escape removal. Parseability of the
/// result is not guaranteed.
pub fn sanitize(text: &str) -> String {
    if serde_json::from_str::<Vec<Value>>(text).is_ok() {
        return text.to_string();
    }

    let stripped = strip_code_fences(text);
    let unquoted = normalize_smart_quotes(stripped);
    let array = extract_array(&unquoted);
    let no_trailing = strip_trailing_commas(array);
    let no_controls = strip_control_chars(&no_trailing);
    strip_invalid_escapes(&no_controls)
}

/// Sanitize a completion and parse it into validated classification
/// entries. Entries that fail shape validation (non-integer id,
/// non-boolean flag, missing explanation) are dropped with a warning
/// rather than propagated.
pub fn parse_classifications(raw: &str) -> Result<Vec<ClassificationResult>, ParseError> {
    let clean = sanitize(raw);
    let entries: Vec<Value> =
        serde_json::from_str(&clean).map_err(|e| ParseError::Unparseable(e.to_string()))?;

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ClassificationResult>(entry) {
            Ok(result) => results.push(result),
            Err(e) => warn!("[SANITIZER] Dropping malformed classification entry: {}", e),
        }
    }
    Ok(results)
}

/// Pull the body out of a markdown code fence, or strip bare fence
/// markers when the fenced form does not match.
fn strip_code_fences(text: &str) -> &str {
    if let Some(captures) = fence_re().captures(text) {
        if let Some(body) = captures.get(1) {
            return body.as_str().trim();
        }
    }
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn normalize_smart_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Slice out the outermost bracket-matched array, skipping brackets
/// inside string literals. Returns the input unchanged when no matched
/// pair is found.
fn extract_array(text: &str) -> &str {
    let Some(start) = text.find('[') else {
        return text;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text[start..].char_indices() {
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
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..start + i + 1];
                }
            }
            _ => {}
        }
    }
    text
}

/// Remove commas that directly precede a closing bracket, outside
/// string literals.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            out.push(ch);
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
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ']' | '}' => {
                loop {
                    let trimmed_len = out.trim_end().len();
                    if out[..trimmed_len].ends_with(',') {
                        out.truncate(trimmed_len - 1);
                    } else {
                        break;
                    }
                }
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

/// Drop illegal C0 control characters. Inside string literals the
/// common whitespace ones are re-escaped instead of dropped, since
/// models sometimes emit literal newlines mid-string. A control
/// character right after a backslash completes the escape the model
/// started, so one pass leaves no raw control in any string.
fn strip_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                match ch {
                    '\n' => out.push('n'),
                    '\r' => out.push('r'),
                    '\t' => out.push('t'),
                    c if (c as u32) < 0x20 => {
                        // Drop the dangling backslash along with the char.
                        out.pop();
                    }
                    c => out.push(c),
                }
                continue;
            }
            match ch {
                '\\' => {
                    out.push(ch);
                    escaped = true;
                }
                '"' => {
                    out.push(ch);
                    in_string = false;
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
        } else {
            match ch {
                '"' => {
                    out.push(ch);
                    in_string = true;
                }
                '\n' | '\r' | '\t' => out.push(ch),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
        }
    }
    out
}

/// Remove backslashes that start an escape sequence JSON does not
/// define. Legal escape pairs are consumed whole, so a valid `\\`
/// followed by any character survives repeated passes.
fn strip_invalid_escapes(text: &str) -> String {
    const LEGAL: [char; 9] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'];

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some(&next) if LEGAL.contains(&next) => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"[{"comment_id": 1, "is_offensive": false, "offense_type": null, "explanation": "fine"}]"#;

    #[test]
    fn test_well_formed_input_passes_through_unchanged() {
        assert_eq!(sanitize(WELL_FORMED), WELL_FORMED);
        let spaced = format!("  {}\n", WELL_FORMED);
        assert_eq!(sanitize(&spaced), spaced);
    }

    #[test]
    fn test_sanitize_is_idempotent_on_malformed_input() {
        let messy = "Here you go:\n```json\n[{\u{201c}comment_id\u{201d}: 1, \u{201c}is_offensive\u{201d}: true, \u{201c}offense_type\u{201d}: \u{201c}insult\u{201d}, \u{201c}explanation\u{201d}: \u{201c}rude\u{201d},},]\n```\nHope that helps!";
        let once = sanitize(messy);
        let twice = sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strips_fenced_block_with_surrounding_prose() {
        let text = "Sure! Here is the result:\n```json\n[1, 2]\n```\nLet me know.";
        assert_eq!(strip_code_fences(text), "[1, 2]");
    }

    #[test]
    fn test_strips_bare_fence_markers() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }

    #[test]
    fn test_normalizes_smart_quotes() {
        let text = "[{\u{201c}a\u{201d}: \u{2018}b\u{2019}}]";
        assert_eq!(normalize_smart_quotes(text), "[{\"a\": 'b'}]");
    }

    #[test]
    fn test_extracts_array_from_surrounding_prose() {
        assert_eq!(extract_array("The answer is [1, [2, 3]] as requested."), "[1, [2, 3]]");
    }

    #[test]
    fn test_extraction_ignores_brackets_inside_strings() {
        let text = r#"note [ {"t": "see [ref]"} ] end"#;
        assert_eq!(extract_array(text), r#"[ {"t": "see [ref]"} ]"#);
    }

    #[test]
    fn test_extraction_without_matched_pair_is_a_noop() {
        assert_eq!(extract_array("no array here"), "no array here");
        assert_eq!(extract_array("[unclosed"), "[unclosed");
    }

    #[test]
    fn test_removes_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"[{"a": 1,}, ]"#), r#"[{"a": 1}]"#);
        assert_eq!(strip_trailing_commas("[1, 2,\n]"), "[1, 2]");
    }

    #[test]
    fn test_keeps_commas_inside_strings() {
        let text = r#"["a,", "b,"]"#;
        assert_eq!(strip_trailing_commas(text), text);
    }

    #[test]
    fn test_escapes_raw_newlines_inside_strings() {
        let text = "[\"line one\nline two\"]";
        assert_eq!(strip_control_chars(text), "[\"line one\\nline two\"]");
        let parsed: Vec<String> = serde_json::from_str(&strip_control_chars(text)).unwrap();
        assert_eq!(parsed[0], "line one\nline two");
    }

    #[test]
    fn test_drops_other_control_chars() {
        let text = "[\"a\u{0} b\u{7}\"]\u{1}";
        assert_eq!(strip_control_chars(text), "[\"a b\"]");
    }

    #[test]
    fn test_backslash_before_raw_newline_repairs_in_one_pass() {
        let fixed = sanitize("[\"a\\\nb\"]");
        assert_eq!(fixed, "[\"a\\nb\"]");
        assert_eq!(sanitize(&fixed), fixed);
        let parsed: Vec<String> = serde_json::from_str(&fixed).unwrap();
        assert_eq!(parsed[0], "a\nb");
    }

    #[test]
    fn test_backslash_before_other_control_drops_both() {
        assert_eq!(strip_control_chars("[\"x\\\u{7}y\"]"), "[\"xy\"]");
    }

    #[test]
    fn test_strips_invalid_escapes_but_keeps_legal_ones() {
        assert_eq!(strip_invalid_escapes(r#"["a\xb"]"#), r#"["axb"]"#);
        assert_eq!(strip_invalid_escapes(r#"["a\nb\u0041\\x"]"#), r#"["a\nb\u0041\\x"]"#);
    }

    #[test]
    fn test_invalid_escape_removal_is_stable() {
        let fixed = strip_invalid_escapes(r#"["c:\new\stuff"]"#);
        assert_eq!(fixed, r#"["c:\newstuff"]"#);
        assert_eq!(strip_invalid_escapes(&fixed), fixed);
    }

    #[test]
    fn test_parses_valid_classification_array() {
        let results = parse_classifications(WELL_FORMED).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comment_id, 1);
        assert!(!results[0].is_offensive);
        assert!(results[0].offense_type.is_none());
    }

    #[test]
    fn test_repairs_smart_quotes_and_trailing_comma_end_to_end() {
        let raw = "```json\n[{\u{201c}comment_id\u{201d}: 3, \u{201c}is_offensive\u{201d}: true, \u{201c}offense_type\u{201d}: \u{201c}harassment\u{201d}, \u{201c}explanation\u{201d}: \u{201c}targets a user\u{201d},}]\n```";
        let results = parse_classifications(raw).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comment_id, 3);
        assert!(results[0].is_offensive);
        assert_eq!(results[0].offense_type.as_deref(), Some("harassment"));
    }

    #[test]
    fn test_drops_entries_that_fail_shape_validation() {
        let raw = r#"[
            {"comment_id": 1, "is_offensive": false, "offense_type": null, "explanation": "ok"},
            {"comment_id": "two", "is_offensive": false, "offense_type": null, "explanation": "bad id"},
            {"comment_id": 3, "is_offensive": "True", "offense_type": null, "explanation": "bad flag"},
            {"comment_id": 4, "is_offensive": true, "offense_type": "spam"}
        ]"#;
        let results = parse_classifications(raw).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comment_id, 1);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = parse_classifications("I cannot help with that request.").unwrap_err();
        assert!(matches!(err, ParseError::Unparseable(_)));
    }
}

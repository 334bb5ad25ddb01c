use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonScanError {
    #[error("no JSON object found in response")]
    NoObject,
    #[error("JSON parse error: {0}")]
    Parse(String),
}

/// Pull the first syntactically valid JSON object out of a noisy reply.
///
/// Model replies wrap the object in prose, markdown fences, or stray
/// braces, so a greedy first-`{`-to-last-`}` match over-captures. Instead
/// the reply is scanned with a balance counter (string- and escape-aware)
/// to produce candidate object spans, and each candidate is parsed in
/// order until one succeeds.
pub fn first_json_object(text: &str) -> Result<Map<String, Value>, JsonScanError> {
    let mut last_parse_error = None;
    for span in candidate_spans(text) {
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => last_parse_error = Some(e.to_string()),
        }
    }
    match last_parse_error {
        Some(e) => Err(JsonScanError::Parse(e)),
        None => Err(JsonScanError::NoObject),
    }
}

/// Top-level balanced `{…}` spans, in order of appearance. A span that
/// never closes (truncated reply) is dropped.
fn candidate_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            // Quotes outside a candidate are prose, not JSON strings.
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    spans
}

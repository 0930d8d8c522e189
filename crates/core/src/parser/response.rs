//! Turns a raw transport reply into message text plus extracted code.

use crate::parser::chunk::split_into_chunks;
use serde_json::Value;

const FENCE: &str = "```";

/// A parsed model reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    /// The full message body, verbatim.
    pub response: String,

    /// Contents of the first fenced code block, without fences or language tag.
    pub code: Option<String>,

    /// `code` split into bounded chunks; empty when there is no code.
    pub code_chunks: Vec<String>,
}

/// Parse a raw reply. Never fails; unrecognized shapes fall back to the raw text.
pub fn parse(raw: &str) -> ParsedResponse {
    let body = unwrap_envelope(raw);
    let code = extract_first_fenced(&body);
    let code_chunks = code.as_deref().map(split_into_chunks).unwrap_or_default();

    ParsedResponse {
        response: body,
        code,
        code_chunks,
    }
}

/// Resolve the message body from the provider envelope.
///
/// `{"type":"textResponse","textResponse":"..."}` yields the inner text and a
/// bare JSON string yields the string. Anything else is treated as plain text.
fn unwrap_envelope(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(text)) => text,
        Ok(Value::Object(map)) => {
            let is_text_response =
                map.get("type").and_then(Value::as_str) == Some("textResponse");
            match map.get("textResponse").and_then(Value::as_str) {
                Some(text) if is_text_response => text.to_string(),
                _ => {
                    tracing::debug!("unexpected response envelope, using raw text");
                    raw.to_string()
                }
            }
        }
        _ => raw.to_string(),
    }
}

fn extract_first_fenced(body: &str) -> Option<String> {
    let open = body.find(FENCE)? + FENCE.len();
    let close = body[open..].find(FENCE)? + open;
    let inner = strip_language_tag(&body[open..close]);
    Some(inner.trim().to_string())
}

/// Drop a leading language tag line such as `rust` or `c++`.
fn strip_language_tag(inner: &str) -> &str {
    match inner.split_once('\n') {
        Some((first, rest)) if is_language_tag(first.trim_end()) => rest,
        _ => inner,
    }
}

fn is_language_tag(candidate: &str) -> bool {
    candidate
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '-' | '#' | '.'))
}

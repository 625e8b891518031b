//! Clean-text recovery from a multipart MIME message tree.
//!
//! Gmail `format=full` payloads are a tree of parts. The walk tracks the
//! best `text/html` and best `text/plain` candidate anywhere in the tree,
//! letting deeper matches override shallower ones. Html wins when present
//! and gets its markup stripped; plain text is decoded verbatim. An empty
//! result means "no task extraction possible for this email", never an
//! error.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// One node of a MIME message tree, deserialized straight from the Gmail
/// API `payload` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

/// Recover clean plain text from a message tree.
pub fn extract_body(root: &MessagePart) -> String {
    if !root.parts.is_empty() {
        let (html, plain) = find_best_parts(&root.parts);
        if let Some(data) = part_data(html) {
            if let Some(decoded) = decode_base64(data) {
                return clean_html(&decoded);
            }
        }
        if let Some(data) = part_data(plain) {
            if let Some(decoded) = decode_base64(data) {
                return decoded;
            }
        }
        return String::new();
    }

    // Leaf root: simple single-part message with inline data.
    match root.body.as_ref().and_then(|b| b.data.as_deref()) {
        Some(data) => decode_base64(data).unwrap_or_default(),
        None => String::new(),
    }
}

/// Walk the part tree, keeping the deepest html and plain candidates.
///
/// Nested matches override ones found at shallower levels, so the most
/// deeply nested candidate is reported.
fn find_best_parts(parts: &[MessagePart]) -> (Option<&MessagePart>, Option<&MessagePart>) {
    let mut html = None;
    let mut plain = None;

    for part in parts {
        if part.mime_type == "text/html" {
            html = Some(part);
        } else if part.mime_type == "text/plain" {
            plain = Some(part);
        }
        if !part.parts.is_empty() {
            let (nested_html, nested_plain) = find_best_parts(&part.parts);
            if nested_html.is_some() {
                html = nested_html;
            }
            if nested_plain.is_some() {
                plain = nested_plain;
            }
        }
    }

    (html, plain)
}

fn part_data(part: Option<&MessagePart>) -> Option<&str> {
    part.and_then(|p| p.body.as_ref()).and_then(|b| b.data.as_deref())
}

/// Decode URL-safe base64 (no padding) as used by the Gmail API, accepting
/// the standard alphabet too. Malformed data is an empty result for that
/// node, not an error.
fn decode_base64(data: &str) -> Option<String> {
    use base64::Engine;
    let engines = [
        base64::engine::general_purpose::URL_SAFE_NO_PAD,
        base64::engine::general_purpose::URL_SAFE,
        base64::engine::general_purpose::STANDARD,
    ];
    for engine in engines {
        if let Ok(bytes) = engine.decode(data) {
            return String::from_utf8(bytes).ok();
        }
    }
    None
}

/// Strip markup from html content: tags, bracketed autolinks, then collapse
/// whitespace runs to single spaces and trim.
fn clean_html(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static AUTOLINK_RE: OnceLock<Regex> = OnceLock::new();
    static WS_RE: OnceLock<Regex> = OnceLock::new();

    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"));
    let autolink_re =
        AUTOLINK_RE.get_or_init(|| Regex::new(r"<http[^>]*>").expect("valid regex"));
    let ws_re = WS_RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let text = tag_re.replace_all(html, " ");
    let text = autolink_re.replace_all(&text, " ");
    let text = ws_re.replace_all(&text, " ");
    text.trim().to_string()
}

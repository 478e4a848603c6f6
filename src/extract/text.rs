// src/extract/text.rs
//! Fragment → plain text, whitespace normalization and the length clamp.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TRUNCATION_MARKER: char = '…';

static RE_BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|section|article|blockquote|ul|ol|table)\s*>")
        .unwrap()
});
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static RE_NL_EDGES: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());
static RE_MANY_NL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Plain text of an HTML fragment: block closers become line breaks,
/// other tags vanish, entities are decoded, whitespace normalized.
pub fn html_to_text(fragment: &str) -> String {
    let broken = RE_BLOCK_BREAK.replace_all(fragment, "\n");
    let stripped = RE_TAGS.replace_all(&broken, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    normalize_whitespace(&decoded)
}

/// NBSP → space, horizontal runs → one space, 3+ newlines → 2, trimmed.
pub fn normalize_whitespace(s: &str) -> String {
    let unified = s.replace("\r\n", "\n").replace(['\r', '\u{00A0}', '\u{202F}'], " ");
    let collapsed = RE_HSPACE.replace_all(&unified, " ");
    let edges = RE_NL_EDGES.replace_all(&collapsed, "\n");
    let out = RE_MANY_NL.replace_all(&edges, "\n\n");
    out.trim().to_string()
}

/// Cut `text` so the result (marker included) is at most `max` chars.
/// Returns the text and whether it was cut. Never splits a word unless the
/// prefix holds no whitespace at all.
pub fn clamp(text: &str, max: usize) -> (String, bool) {
    if text.chars().count() <= max {
        return (text.to_string(), false);
    }
    if max == 0 {
        return (String::new(), true);
    }

    let keep = max - 1;
    let cut_at = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut_at];

    // The char right after the cut being whitespace means no word was split.
    let at_boundary = text[cut_at..].starts_with(char::is_whitespace);
    let head = if at_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) if i > 0 => &head[..i],
            _ => head,
        }
    };

    let mut out = head.trim_end().to_string();
    out.push(TRUNCATION_MARKER);
    (out, true)
}

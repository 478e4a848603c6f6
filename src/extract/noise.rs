// src/extract/noise.rs
//! Drops regions whose text must never count as content.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<svg\b[^>]*>.*?</svg\s*>",
    )
    .unwrap()
});

/// Remove comments and script/style/noscript/svg elements (non-greedy).
pub fn strip_noise(html: &str) -> String {
    RE_NOISE.replace_all(html, " ").into_owned()
}

// src/extract/locate.rs
//! Depth-balanced "find the whole `<tag>…</tag>` block" without a DOM.
//!
//! The default [`ScanLocator`] walks two forward cursors, one over opening
//! tags and one over closing tags, always stepping whichever comes first.
//! Each open bumps the depth; a close at depth zero ends the block. This is
//! an approximation of parsing: self-closing same-name tags and unbalanced
//! markup will confuse it, in which case it reports no block.

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Tags the extraction pipeline asks for on every page.
pub const PRECOMPILED_TAGS: [&str; 9] = [
    "article", "main", "body", "div", "section", "header", "nav", "footer", "aside",
];

static PRECOMPILED: Lazy<Vec<(&'static str, TagPatterns)>> = Lazy::new(|| {
    PRECOMPILED_TAGS
        .iter()
        .filter_map(|t| Some((*t, TagPatterns::new(t)?)))
        .collect()
});

/// Locate a balanced element by tag name. Implementations must be pure.
pub trait BlockLocator: Send + Sync {
    /// Byte span of the first `<tag …>` at or after `from` through its
    /// matching `</tag>`, or `None` when there is no open or no matching close.
    fn locate(&self, html: &str, tag: &str, from: usize) -> Option<Range<usize>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanLocator;

impl BlockLocator for ScanLocator {
    fn locate(&self, html: &str, tag: &str, from: usize) -> Option<Range<usize>> {
        let patterns = patterns_for(tag)?;
        scan_block(html, &patterns, from)
    }
}

/// Shared patterns for the common tags, a fresh compile for anything else.
pub fn patterns_for(tag: &str) -> Option<Cow<'static, TagPatterns>> {
    match PRECOMPILED.iter().find(|(name, _)| name.eq_ignore_ascii_case(tag)) {
        Some((_, p)) => Some(Cow::Borrowed(p)),
        None => TagPatterns::new(tag).map(Cow::Owned),
    }
}

/// Opening/closing patterns for one tag name.
#[derive(Debug, Clone)]
pub struct TagPatterns {
    open: Regex,
    close: Regex,
}

impl TagPatterns {
    /// `None` for names that are not plain tag identifiers.
    pub fn new(tag: &str) -> Option<Self> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        let open = Regex::new(&format!(r"(?i)<{tag}\b[^>]*>")).ok()?;
        let close = Regex::new(&format!(r"(?i)</{tag}\s*>")).ok()?;
        Some(Self { open, close })
    }
}

/// Cursor positions for one scan; lives on the stack of a single call.
struct Cursors<'h> {
    next_open: Option<Match<'h>>,
    next_close: Option<Match<'h>>,
}

/// The scan itself. All state is local, so one `TagPatterns` can be shared
/// freely between concurrent callers.
pub fn scan_block(html: &str, patterns: &TagPatterns, from: usize) -> Option<Range<usize>> {
    if from > html.len() || !html.is_char_boundary(from) {
        return None;
    }
    let start = patterns.open.find_at(html, from)?;
    let mut cur = Cursors {
        next_open: patterns.open.find_at(html, start.end()),
        next_close: patterns.close.find_at(html, start.end()),
    };
    let mut depth = 0usize;

    loop {
        let close = cur.next_close?;
        match cur.next_open {
            Some(open) if open.start() < close.start() => {
                depth += 1;
                cur.next_open = patterns.open.find_at(html, open.end());
            }
            _ => {
                if depth == 0 {
                    return Some(start.start()..close.end());
                }
                depth -= 1;
                cur.next_close = patterns.close.find_at(html, close.end());
            }
        }
    }
}

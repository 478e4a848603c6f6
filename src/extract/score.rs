// src/extract/score.rs
//! Text-density scoring of candidate blocks and the prose quality gate.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::html_to_text;

pub const MIN_CANDIDATE_CHARS: usize = 280;

pub const GATE_MIN_CHARS: usize = 900;
pub const GATE_SHORT_LINE_CHARS: usize = 45;
pub const GATE_MAX_SHORT_FRACTION: f64 = 0.70;
pub const GATE_MIN_SENTENCE_MARKS: usize = 12;

static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<a\b").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub html: String,
    pub text: String,
    pub text_chars: usize,
    pub link_count: usize,
    pub score: f64,
}

impl ContentBlock {
    pub fn from_fragment(html: String) -> Self {
        let text = html_to_text(&html);
        let text_chars = text.chars().count();
        let link_count = RE_ANCHOR.find_iter(&html).count();
        let score = text_chars as f64 / (link_count as f64 + 1.0);
        Self {
            html,
            text,
            text_chars,
            link_count,
            score,
        }
    }
}

/// Highest score among blocks with at least `MIN_CANDIDATE_CHARS` of text;
/// otherwise the longest text. Ties keep the earlier block.
pub fn pick_winner(blocks: Vec<ContentBlock>) -> Option<ContentBlock> {
    let mut best_scored: Option<ContentBlock> = None;
    let mut longest: Option<ContentBlock> = None;

    for b in blocks {
        if b.text_chars >= MIN_CANDIDATE_CHARS
            && best_scored.as_ref().map_or(true, |cur| b.score > cur.score)
        {
            best_scored = Some(b.clone());
        }
        if longest.as_ref().map_or(true, |cur| b.text_chars > cur.text_chars) {
            longest = Some(b);
        }
    }

    best_scored.or(longest)
}

/// Why local text was sent to the remote fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    TooShort,
    MenuLike,
}

impl GateVerdict {
    pub fn passed(self) -> bool {
        self == Self::Pass
    }
}

/// Prose check on normalized text.
pub fn quality_gate(text: &str) -> GateVerdict {
    if text.chars().count() < GATE_MIN_CHARS {
        return GateVerdict::TooShort;
    }

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let short = lines
        .iter()
        .filter(|l| l.chars().count() < GATE_SHORT_LINE_CHARS)
        .count();
    let short_fraction = if lines.is_empty() {
        1.0
    } else {
        short as f64 / lines.len() as f64
    };
    let marks = text
        .chars()
        .filter(|c| matches!(c, '.' | '!' | '?' | '…'))
        .count();

    if short_fraction > GATE_MAX_SHORT_FRACTION && marks < GATE_MIN_SENTENCE_MARKS {
        GateVerdict::MenuLike
    } else {
        GateVerdict::Pass
    }
}

// src/feed/relevance.rs
//! Keyword relevance gate for news items: at least one allow-listed keyword,
//! zero block-listed ones. Noise dominates.

use regex::Regex;

use crate::config::RelevanceConfig;

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    allow: Option<Regex>,
    block: Option<Regex>,
}

/// Why an item was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Relevant,
    NoSportsKeyword,
    Noise,
}

impl RelevanceFilter {
    pub fn new(allow: &[String], block: &[String]) -> Self {
        Self {
            allow: compile_keywords(allow),
            block: compile_keywords(block),
        }
    }

    pub fn from_config(cfg: &RelevanceConfig) -> Self {
        Self::new(&cfg.allow, &cfg.block)
    }

    pub fn judge(&self, text: &str) -> Verdict {
        if self.block.as_ref().is_some_and(|re| re.is_match(text)) {
            return Verdict::Noise;
        }
        match &self.allow {
            Some(re) if re.is_match(text) => Verdict::Relevant,
            _ => Verdict::NoSportsKeyword,
        }
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        self.judge(text) == Verdict::Relevant
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::from_config(&RelevanceConfig::default())
    }
}

/// One case-insensitive, word-bounded alternation; `None` for an empty list.
fn compile_keywords(words: &[String]) -> Option<Regex> {
    let alts: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect();
    if alts.is_empty() {
        return None;
    }
    let pattern = format!(r"(?iu)\b(?:{})\b", alts.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(target: "feed", error = %e, "relevance keyword list did not compile");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RelevanceFilter {
        RelevanceFilter::new(
            &["futebol".into(), "gol".into(), "fórmula 1".into(), "nba".into()],
            &["iphone".into(), "bolsa de valores".into()],
        )
    }

    #[test]
    fn needs_a_sports_keyword() {
        let f = filter();
        assert_eq!(f.judge("Flamengo marca gol no fim"), Verdict::Relevant);
        assert_eq!(f.judge("Chuva forte em São Paulo"), Verdict::NoSportsKeyword);
    }

    #[test]
    fn noise_dominates() {
        let f = filter();
        assert_eq!(f.judge("Novo iPhone chega ao futebol"), Verdict::Noise);
        assert!(!f.is_relevant("Futebol e Bolsa  de valores"));
    }

    #[test]
    fn word_boundaries_and_case() {
        let f = filter();
        // "golpe" must not count as "gol"
        assert_eq!(f.judge("Golpe no mercado"), Verdict::NoSportsKeyword);
        assert!(f.is_relevant("FÓRMULA 1: corrida em Interlagos"));
        assert!(f.is_relevant("Final da NBA"));
    }

    #[test]
    fn empty_allow_list_keeps_nothing() {
        let f = RelevanceFilter::new(&[], &[]);
        assert!(!f.is_relevant("futebol"));
    }

    #[test]
    fn defaults_cover_portuguese_sports() {
        let f = RelevanceFilter::default();
        assert!(f.is_relevant("Palmeiras vence pelo Brasileirão"));
        assert!(!f.is_relevant("Hotel recebe torcedores do clube"));
    }
}

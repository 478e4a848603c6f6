// src/extract/mod.rs
//! Extraction engine: arbitrary third-party HTML → bounded plain-text article.
//!
//! Noise removal → candidate collection → density scoring → quality gate,
//! with a remote readability fallback when the local text looks like a menu
//! or is missing, and a final clamp to the requested view size.

pub mod candidates;
pub mod fetch;
pub mod locate;
pub mod noise;
pub mod readability;
pub mod score;
pub mod text;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ExtractConfig;
use crate::error::CoreError;
use crate::logging::anon_hash;
use candidates::collect_candidates;
use fetch::{validate_target, HttpFetcher, PageFetcher};
use locate::{BlockLocator, ScanLocator};
use readability::{ProxyReadability, Readability};
use score::{pick_winner, quality_gate, ContentBlock, GateVerdict};
use text::{clamp, html_to_text};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub title: String,
    pub content: String,
    pub truncated: bool,
}

/// Inline preview or the full reader view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    Preview,
    #[default]
    Full,
}

impl ViewMode {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("preview") {
            Self::Preview
        } else {
            Self::Full
        }
    }
}

/// Which strategy produced the final content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Local,
    Remote,
    Empty,
}

impl ContentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Empty => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub url: Url,
    pub result: ExtractionResult,
    pub source: ContentSource,
}

/// Outcome of the local (no network) half of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalExtraction {
    pub title: Option<String>,
    pub text: String,
}

/// Local extraction over raw HTML. Pure and deterministic.
pub fn extract_local(html: &str, locator: &dyn BlockLocator) -> LocalExtraction {
    let title = extract_title(html);
    let cleaned = noise::strip_noise(html);
    let blocks: Vec<ContentBlock> = collect_candidates(&cleaned, locator)
        .into_iter()
        .map(ContentBlock::from_fragment)
        .collect();
    let text = pick_winner(blocks).map(|b| b.text).unwrap_or_default();
    LocalExtraction { title, text }
}

static RE_OG_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\b[^>]*\bproperty\s*=\s*["']og:title["'][^>]*>"#).unwrap()
});
static RE_CONTENT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bcontent\s*=\s*"([^"]*)"|\bcontent\s*=\s*'([^']*)'"#).unwrap());
static RE_TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static RE_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());

/// `og:title`, then `<title>`, then the first `<h1>`.
pub fn extract_title(html: &str) -> Option<String> {
    let og = RE_OG_TITLE
        .find(html)
        .and_then(|m| RE_CONTENT_ATTR.captures(m.as_str()))
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string());
    let title_tag = || {
        RE_TITLE_TAG
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };
    let h1 = || {
        RE_H1
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    [og, title_tag(), h1()]
        .into_iter()
        .flatten()
        .map(|raw| html_to_text(&raw).replace('\n', " "))
        .find(|t| !t.is_empty())
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "extract_requests_total",
            "Extractions by winning path (local, remote, none)."
        );
        describe_histogram!("extract_fetch_ms", "Direct page fetch time in milliseconds.");
    });
}

pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    readability: Arc<dyn Readability>,
    locator: Arc<dyn BlockLocator>,
    cfg: ExtractConfig,
}

impl Extractor {
    pub fn new(
        cfg: ExtractConfig,
        fetcher: Arc<dyn PageFetcher>,
        readability: Arc<dyn Readability>,
    ) -> Self {
        Self {
            fetcher,
            readability,
            locator: Arc::new(ScanLocator),
            cfg,
        }
    }

    /// Production wiring: reqwest fetcher + readability proxy from config.
    pub fn from_config(cfg: ExtractConfig, client: reqwest::Client) -> Self {
        let fetcher = HttpFetcher::new(client.clone(), cfg.fetch_timeout(), cfg.max_html_bytes);
        let readability = ProxyReadability::new(
            client,
            cfg.readability_base.clone(),
            cfg.readability_timeout(),
        );
        Self::new(cfg, Arc::new(fetcher), Arc::new(readability))
    }

    pub fn with_locator(mut self, locator: Arc<dyn BlockLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn max_chars(&self, mode: ViewMode) -> usize {
        match mode {
            ViewMode::Preview => self.cfg.preview_max_chars,
            ViewMode::Full => self.cfg.full_max_chars,
        }
    }

    /// Full pipeline for one URL. Only `CoreError::InvalidInput` escapes;
    /// every upstream failure degrades to an empty `content`.
    pub async fn extract(&self, raw_url: &str, mode: ViewMode) -> Result<Extraction, CoreError> {
        ensure_metrics_described();
        let url = validate_target(raw_url)?;
        let id = anon_hash(url.as_str());

        let local = match self.fetcher.fetch(&url).await {
            Ok(doc) => Some(extract_local(&doc.html(), self.locator.as_ref())),
            Err(e) => {
                warn!(target: "extract", %id, kind = e.kind(), error = %e, "direct fetch failed");
                None
            }
        };

        let verdict = local.as_ref().map(|l| quality_gate(&l.text));
        let (mut title, mut content) = match local {
            Some(l) => (l.title, l.text),
            None => (None, String::new()),
        };
        let mut source = if content.is_empty() {
            ContentSource::Empty
        } else {
            ContentSource::Local
        };

        if !verdict.is_some_and(GateVerdict::passed) {
            debug!(target: "extract", %id, ?verdict, "local text rejected, trying readability");
            match self.readability.fetch_text(&url).await {
                Ok(remote) => {
                    if remote.content.chars().count() > content.chars().count() {
                        content = remote.content;
                        source = ContentSource::Remote;
                        if title.is_none() {
                            title = remote.title;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        target: "extract",
                        %id,
                        provider = self.readability.name(),
                        kind = e.kind(),
                        "readability fallback failed"
                    );
                }
            }
        }

        let (content, truncated) = clamp(&content, self.max_chars(mode));
        counter!("extract_requests_total", "path" => source.as_str()).increment(1);
        info!(
            target: "extract",
            %id,
            path = source.as_str(),
            chars = content.chars().count(),
            truncated,
            "extraction finished"
        );

        Ok(Extraction {
            url,
            result: ExtractionResult {
                title: title.unwrap_or_default(),
                content,
                truncated,
            },
            source,
        })
    }
}

// src/extract/readability.rs
//! Remote readability fallback: an external proxy turns a page into text,
//! we strip its metadata labels and consent/subscription boilerplate.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use url::Url;

use super::text::normalize_whitespace;
use crate::error::{with_deadline, CoreError};

/// Text as returned by a readability service, already cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteText {
    pub title: Option<String>,
    pub content: String,
}

#[async_trait]
pub trait Readability: Send + Sync {
    async fn fetch_text(&self, target: &Url) -> Result<RemoteText, CoreError>;
    fn name(&self) -> &'static str;
}

/// `GET <base><absolute-url>` against an r.jina.ai-style proxy.
pub struct ProxyReadability {
    client: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl ProxyReadability {
    pub fn new(client: reqwest::Client, base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base: base.into(),
            timeout,
        }
    }

    fn endpoint(&self, target: &Url) -> String {
        let base = self.base.trim_end_matches('/');
        format!("{base}/{target}")
    }
}

#[async_trait]
impl Readability for ProxyReadability {
    async fn fetch_text(&self, target: &Url) -> Result<RemoteText, CoreError> {
        let endpoint = self.endpoint(target);
        let raw = with_deadline(self.timeout, async {
            let resp = self
                .client
                .get(&endpoint)
                .header(reqwest::header::ACCEPT, "text/plain,*/*")
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(CoreError::UpstreamStatus {
                    status: resp.status().as_u16(),
                });
            }
            Ok(resp.text().await?)
        })
        .await?;
        Ok(clean_remote_text(&raw))
    }

    fn name(&self) -> &'static str {
        "readability-proxy"
    }
}

static RE_TITLE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:#+\s*)?(?:\*\*)?(?:title|título)(?:\*\*)?\s*:\s*(.+?)\s*$").unwrap());

static RE_META_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:#+\s*)?(?:\*\*)?(?:title|título|url source|url|source|fonte|author|autor|por|by|published time|published|publicado em|date|data|markdown content)(?:\*\*)?\s*:.*$",
    )
    .unwrap()
});

/// Lines shorter than this that mention a boilerplate phrase are dropped.
const BOILERPLATE_MAX_LINE_CHARS: usize = 200;

const BOILERPLATE_PHRASES: [&str; 21] = [
    "cookie",
    "accept all",
    "aceitar",
    "aceito",
    "consent",
    "consentimento",
    "privacy policy",
    "política de privacidade",
    "subscribe",
    "subscription",
    "assine",
    "assinante",
    "newsletter",
    "sign in",
    "log in",
    "faça login",
    "all rights reserved",
    "todos os direitos reservados",
    "advertisement",
    "publicidade",
    "continue reading",
];

/// Strip metadata labels and short boilerplate lines, then normalize.
pub fn clean_remote_text(raw: &str) -> RemoteText {
    let title = RE_TITLE_LABEL
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let without_meta = RE_META_LINE.replace_all(raw, "");
    let kept: Vec<&str> = without_meta
        .lines()
        .filter(|line| !is_boilerplate_line(line))
        .collect();

    RemoteText {
        title,
        content: normalize_whitespace(&kept.join("\n")),
    }
}

fn is_boilerplate_line(line: &str) -> bool {
    if line.chars().count() >= BOILERPLATE_MAX_LINE_CHARS {
        return false;
    }
    let lower = line.to_lowercase();
    BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p))
}

// src/feed/types.rs
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::relevance::RelevanceFilter;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl NewsItem {
    /// Drops items without a real title or a parseable date.
    pub fn new(title: &str, description: &str, published: &str) -> Option<Self> {
        let title = clean_title(title)?;
        let published_at = parse_timestamp(published)?;
        Some(Self {
            title,
            description: description.trim().to_string(),
            published_at,
            image_url: None,
            source_url: None,
            source_name: None,
        })
    }

    pub fn with_image(mut self, url: Option<&str>) -> Self {
        self.image_url = url.and_then(http_url);
        self
    }

    pub fn with_source(mut self, url: Option<&str>, name: Option<&str>) -> Self {
        self.source_url = url.and_then(http_url);
        self.source_name = name.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        self
    }

    /// Text the relevance filter looks at.
    pub fn haystack(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchItem {
    pub title: String,
    pub kickoff_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: MatchStatus,
}

impl MatchItem {
    pub fn new(title: &str, kickoff: &str, status: MatchStatus) -> Option<Self> {
        Some(Self {
            title: clean_title(title)?,
            kickoff_time: parse_timestamp(kickoff)?,
            league: None,
            url: None,
            status,
        })
    }

    pub fn with_league(mut self, league: Option<&str>) -> Self {
        self.league = league.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        self
    }

    pub fn with_url(mut self, url: Option<&str>) -> Self {
        self.url = url.and_then(http_url);
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Featured {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    Matches,
}

/// One provider call, for the non-production trace.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider_name: String,
    pub category: Category,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub news: Vec<NewsItem>,
    pub next_matches: Vec<MatchItem>,
    pub last_results: Vec<MatchItem>,
    pub featured: Featured,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<ProviderAttempt>>,
}

/// Successful provider response: items plus the upstream status for the trace.
/// `warning` records a partial failure the provider recovered from.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub items: T,
    pub http_status: Option<u16>,
    pub warning: Option<String>,
}

impl<T> Fetched<T> {
    pub fn ok(items: T) -> Self {
        Self {
            items,
            http_status: Some(200),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// A news upstream. Errors are wrapped `CoreError`s where the cause is known.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// The filter is passed in for providers that decide on follow-up
    /// queries based on how many relevant items they already have.
    async fn fetch_news(&self, relevance: &RelevanceFilter) -> Result<Fetched<Vec<NewsItem>>>;
    fn name(&self) -> &'static str;
}

/// A fixtures/results upstream. Items carry their own status.
#[async_trait::async_trait]
pub trait MatchSource: Send + Sync {
    async fn fetch_matches(&self) -> Result<Fetched<Vec<MatchItem>>>;
    fn name(&self) -> &'static str;
}

/// RFC 3339, RFC 2822, `YYYY-MM-DDTHH:MM:SS±HHMM`, or naive UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

fn clean_title(title: &str) -> Option<String> {
    let t = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if t.is_empty() || t.eq_ignore_ascii_case("[removed]") {
        None
    } else {
        Some(t)
    }
}

fn http_url(u: &str) -> Option<String> {
    let u = u.trim();
    (u.starts_with("http://") || u.starts_with("https://")).then(|| u.to_string())
}

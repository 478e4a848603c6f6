// src/feed/mod.rs
//! Aggregation engine: per-category provider chains (news, matches) that
//! fall through in order until one yields usable items, plus a `featured`
//! summary and a diagnostic trace.

pub mod providers;
pub mod relevance;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CoreConfig;
use crate::error::CoreError;
use relevance::RelevanceFilter;
use types::{
    Category, Featured, Feed, Fetched, MatchItem, MatchSource, MatchStatus, NewsItem, NewsSource,
    ProviderAttempt,
};

pub const MAX_NEWS: usize = 8;
pub const MAX_MATCHES: usize = 12;
pub const PLACEHOLDER_NEWS_TITLE: &str = "Notícias indisponíveis";

const TRACE_ERROR_MAX_CHARS: usize = 160;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_provider_attempts_total",
            "Provider calls by provider and outcome (ok, empty, error)."
        );
        describe_counter!("feed_runs_total", "Completed feed aggregations.");
        describe_histogram!("feed_parse_ms", "Provider parse time in milliseconds.");
    });
}

pub struct Aggregator {
    news: Vec<Arc<dyn NewsSource>>,
    matches: Vec<Arc<dyn MatchSource>>,
    relevance: RelevanceFilter,
    timeout: Duration,
    require_image: bool,
    include_trace: bool,
}

impl Aggregator {
    pub fn new(
        news: Vec<Arc<dyn NewsSource>>,
        matches: Vec<Arc<dyn MatchSource>>,
        relevance: RelevanceFilter,
    ) -> Self {
        Self {
            news,
            matches,
            relevance,
            timeout: Duration::from_secs(10),
            require_image: false,
            include_trace: false,
        }
    }

    pub fn from_config(cfg: &CoreConfig, client: &reqwest::Client) -> Self {
        Self::new(
            providers::build_news_sources(&cfg.feed, client),
            providers::build_match_sources(&cfg.feed, client),
            RelevanceFilter::from_config(&cfg.relevance),
        )
        .with_timeout(cfg.feed.provider_timeout())
        .with_require_image(cfg.feed.require_news_image)
        .with_trace(cfg.feed.include_trace)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_require_image(mut self, on: bool) -> Self {
        self.require_image = on;
        self
    }

    pub fn with_trace(mut self, on: bool) -> Self {
        self.include_trace = on;
        self
    }

    pub async fn run(&self) -> Feed {
        self.run_at(Utc::now()).await
    }

    /// Resolve both categories concurrently and assemble the feed.
    /// Never fails: every provider error ends up in the trace.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Feed {
        ensure_metrics_described();

        let ((news, news_trace), (next_matches, last_results, match_trace)) =
            tokio::join!(self.resolve_news(), self.resolve_matches());

        let featured = derive_featured(&next_matches, &last_results, &news);
        let news = if news.is_empty() {
            vec![placeholder_news(now)]
        } else {
            news
        };

        counter!("feed_runs_total").increment(1);
        tracing::info!(
            target: "feed",
            news = news.len(),
            next = next_matches.len(),
            last = last_results.len(),
            "feed assembled"
        );

        let trace = self.include_trace.then(|| {
            let mut t = news_trace;
            t.extend(match_trace);
            t
        });

        Feed {
            news,
            next_matches,
            last_results,
            featured,
            trace,
        }
    }

    async fn resolve_news(&self) -> (Vec<NewsItem>, Vec<ProviderAttempt>) {
        let mut attempts = Vec::new();
        for src in &self.news {
            match self.bounded(src.fetch_news(&self.relevance)).await {
                Ok(fetched) => {
                    let items = self.keep_news(fetched.items);
                    attempts.push(success(
                        src.name(),
                        Category::News,
                        fetched.http_status,
                        fetched.warning,
                        items.len(),
                    ));
                    if !items.is_empty() {
                        return (items, attempts);
                    }
                }
                Err(e) => attempts.push(failure(src.name(), Category::News, &e)),
            }
        }
        (Vec::new(), attempts)
    }

    async fn resolve_matches(&self) -> (Vec<MatchItem>, Vec<MatchItem>, Vec<ProviderAttempt>) {
        let mut attempts = Vec::new();
        for src in &self.matches {
            match self.bounded(src.fetch_matches()).await {
                Ok(fetched) => {
                    let (next, last) = split_matches(fetched.items);
                    attempts.push(success(
                        src.name(),
                        Category::Matches,
                        fetched.http_status,
                        fetched.warning,
                        next.len() + last.len(),
                    ));
                    if !next.is_empty() || !last.is_empty() {
                        return (next, last, attempts);
                    }
                }
                Err(e) => attempts.push(failure(src.name(), Category::Matches, &e)),
            }
        }
        (Vec::new(), Vec::new(), attempts)
    }

    async fn bounded<T, F>(&self, fut: F) -> anyhow::Result<Fetched<T>>
    where
        F: Future<Output = anyhow::Result<Fetched<T>>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(CoreError::Timeout(self.timeout).into()),
        }
    }

    /// Relevance, optional image requirement, title dedup, cap.
    fn keep_news(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|n| self.relevance.is_relevant(&n.haystack()))
            .filter(|n| !self.require_image || n.image_url.is_some())
            .filter(|n| seen.insert(n.title.to_lowercase()))
            .take(MAX_NEWS)
            .collect()
    }
}

/// Upcoming ascending, finished descending, each capped.
pub fn split_matches(items: Vec<MatchItem>) -> (Vec<MatchItem>, Vec<MatchItem>) {
    let (mut next, mut last): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|m| m.status == MatchStatus::Upcoming);
    next.sort_by(|a, b| {
        a.kickoff_time
            .cmp(&b.kickoff_time)
            .then_with(|| a.title.cmp(&b.title))
    });
    last.sort_by(|a, b| {
        b.kickoff_time
            .cmp(&a.kickoff_time)
            .then_with(|| a.title.cmp(&b.title))
    });
    next.truncate(MAX_MATCHES);
    last.truncate(MAX_MATCHES);
    (next, last)
}

/// First upcoming match, else latest result, else first headline.
pub fn derive_featured(next: &[MatchItem], last: &[MatchItem], news: &[NewsItem]) -> Featured {
    if let Some(m) = next.first() {
        let when = m.kickoff_time.format("%d/%m %H:%M UTC").to_string();
        return Featured {
            title: format!("Destaque: {}", m.title),
            subtitle: with_league(when, m.league.as_deref()),
            note: last
                .first()
                .map(|r| with_league(format!("Último resultado: {}", r.title), r.league.as_deref())),
        };
    }
    if let Some(r) = last.first() {
        return Featured {
            title: format!("Último resultado: {}", r.title),
            subtitle: r
                .league
                .clone()
                .unwrap_or_else(|| "Resultados recentes".to_string()),
            note: None,
        };
    }
    if let Some(n) = news.first() {
        return Featured {
            title: n.title.clone(),
            subtitle: n.source_name.clone().unwrap_or_else(|| "Notícias".to_string()),
            note: None,
        };
    }
    Featured {
        title: "Destaque do esporte".to_string(),
        subtitle: "Próximos jogos".to_string(),
        note: None,
    }
}

fn with_league(head: String, league: Option<&str>) -> String {
    match league {
        Some(l) => format!("{head} • {l}"),
        None => head,
    }
}

pub fn placeholder_news(now: DateTime<Utc>) -> NewsItem {
    NewsItem {
        title: PLACEHOLDER_NEWS_TITLE.to_string(),
        description: String::new(),
        published_at: now,
        image_url: None,
        source_url: None,
        source_name: Some("Feed".to_string()),
    }
}

/// A provider that answered. A recovered partial failure rides along in `error`.
fn success(
    name: &str,
    category: Category,
    http_status: Option<u16>,
    warning: Option<String>,
    count: usize,
) -> ProviderAttempt {
    let outcome = if count > 0 { "ok" } else { "empty" };
    counter!("feed_provider_attempts_total", "provider" => name.to_string(), "outcome" => outcome)
        .increment(1);
    tracing::debug!(target: "feed", provider = name, ?category, count, warning = ?warning, "provider answered");
    ProviderAttempt {
        provider_name: name.to_string(),
        category,
        success: true,
        http_status,
        item_count: count,
        error: warning,
    }
}

fn failure(name: &str, category: Category, err: &anyhow::Error) -> ProviderAttempt {
    counter!("feed_provider_attempts_total", "provider" => name.to_string(), "outcome" => "error")
        .increment(1);
    let core = err.chain().find_map(|c| c.downcast_ref::<CoreError>());
    tracing::warn!(
        target: "feed",
        provider = name,
        ?category,
        kind = core.map(CoreError::kind).unwrap_or("parse"),
        error = %format!("{err:#}"),
        "provider failed"
    );
    ProviderAttempt {
        provider_name: name.to_string(),
        category,
        success: false,
        http_status: core.and_then(CoreError::http_status),
        item_count: 0,
        error: Some(format!("{err:#}").chars().take(TRACE_ERROR_MAX_CHARS).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(title: &str, ts: &str, status: MatchStatus) -> MatchItem {
        MatchItem::new(title, ts, status).unwrap()
    }

    #[test]
    fn split_orders_and_caps() {
        let mut items = Vec::new();
        for day in 1..=20 {
            let ts = format!("2024-05-{day:02}T18:00:00Z");
            items.push(m(&format!("U{day}"), &ts, MatchStatus::Upcoming));
            items.push(m(&format!("F{day}"), &ts, MatchStatus::Finished));
        }
        items.reverse();
        let (next, last) = split_matches(items);
        assert_eq!(next.len(), MAX_MATCHES);
        assert_eq!(last.len(), MAX_MATCHES);
        assert!(next.windows(2).all(|w| w[0].kickoff_time <= w[1].kickoff_time));
        assert!(last.windows(2).all(|w| w[0].kickoff_time >= w[1].kickoff_time));
        assert_eq!(next[0].title, "U1");
        assert_eq!(last[0].title, "F20");
    }

    #[test]
    fn featured_prefers_upcoming_then_result_then_news() {
        let up = m("A vs B", "2024-05-02T19:30:00Z", MatchStatus::Upcoming).with_league(Some("Série A"));
        let fin = m("C vs D — 1:0", "2024-05-01T19:30:00Z", MatchStatus::Finished);
        let news = NewsItem::new("Manchete", "", "2024-05-01T10:00:00Z").unwrap();

        let f = derive_featured(std::slice::from_ref(&up), std::slice::from_ref(&fin), &[]);
        assert_eq!(f.title, "Destaque: A vs B");
        assert_eq!(f.subtitle, "02/05 19:30 UTC • Série A");
        assert_eq!(f.note.as_deref(), Some("Último resultado: C vs D — 1:0"));

        let f = derive_featured(&[], std::slice::from_ref(&fin), &[]);
        assert_eq!(f.title, "Último resultado: C vs D — 1:0");
        assert_eq!(f.subtitle, "Resultados recentes");

        let f = derive_featured(&[], &[], std::slice::from_ref(&news));
        assert_eq!(f.title, "Manchete");

        let f = derive_featured(&[], &[], &[]);
        assert_eq!(f.title, "Destaque do esporte");
    }
}

// src/feed/providers/newsapi.rs
//! Keyed search API: curated sports headlines first, broad keyword search
//! merged in when too few relevant headlines come back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CoreError;
use crate::feed::relevance::RelevanceFilter;
use crate::feed::types::{Fetched, NewsItem, NewsSource};

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published_at: Option<String>,
    url_to_image: Option<String>,
    url: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// Parse a NewsAPI JSON body into items; invalid articles are dropped.
pub fn parse_articles(body: &str) -> Result<Vec<NewsItem>> {
    let resp: Response = serde_json::from_str(body).context("parsing newsapi json")?;
    Ok(resp
        .articles
        .into_iter()
        .filter_map(|a| {
            let description = a
                .description
                .filter(|d| !d.trim().is_empty())
                .or(a.content)
                .unwrap_or_default();
            NewsItem::new(
                a.title.as_deref().unwrap_or_default(),
                &description,
                a.published_at.as_deref().unwrap_or_default(),
            )
            .map(|n| {
                n.with_image(a.url_to_image.as_deref()).with_source(
                    a.url.as_deref(),
                    a.source.as_ref().and_then(|s| s.name.as_deref()),
                )
            })
        })
        .collect())
}

pub struct NewsApiProvider {
    client: reqwest::Client,
    base: String,
    api_key: Option<String>,
    broad_query: String,
    min_relevant: usize,
}

impl NewsApiProvider {
    pub fn new(
        client: reqwest::Client,
        base: impl Into<String>,
        api_key: Option<String>,
        broad_query: impl Into<String>,
        min_relevant: usize,
    ) -> Self {
        Self {
            client,
            base: base.into(),
            api_key,
            broad_query: broad_query.into(),
            min_relevant,
        }
    }

    async fn query(&self, key: &str, path: &str, params: &[(&str, &str)]) -> Result<Vec<NewsItem>> {
        let url = format!("{}/{}", self.base.trim_end_matches('/'), path);
        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", key)
            .query(params)
            .send()
            .await
            .map_err(CoreError::from)
            .with_context(|| format!("newsapi {path}"))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(CoreError::UpstreamStatus { status }).context(format!("newsapi {path}"));
        }
        let body = resp
            .text()
            .await
            .map_err(CoreError::from)
            .context("newsapi body")?;
        parse_articles(&body)
    }
}

#[async_trait]
impl NewsSource for NewsApiProvider {
    async fn fetch_news(&self, relevance: &RelevanceFilter) -> Result<Fetched<Vec<NewsItem>>> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(CoreError::MissingCredential("newsapi").into());
        };

        let top = self
            .query(
                key,
                "top-headlines",
                &[("country", "br"), ("category", "sports"), ("pageSize", "50")],
            )
            .await;
        let (mut items, top_err) = match top {
            Ok(v) => (v, None),
            Err(e) => {
                tracing::warn!(target: "feed", error = ?e, "newsapi headlines failed");
                (Vec::new(), Some(e))
            }
        };

        let relevant = items
            .iter()
            .filter(|n| relevance.is_relevant(&n.haystack()))
            .count();
        if top_err.is_none() && relevant >= self.min_relevant {
            return Ok(Fetched::ok(items));
        }

        let broad = self
            .query(
                key,
                "everything",
                &[
                    ("q", self.broad_query.as_str()),
                    ("language", "pt"),
                    ("sortBy", "publishedAt"),
                    ("pageSize", "50"),
                ],
            )
            .await;
        match (broad, top_err) {
            (Ok(mut more), None) => {
                items.append(&mut more);
                Ok(Fetched::ok(items))
            }
            // Headlines failed but the broad search carried the request.
            (Ok(more), Some(first)) => Ok(Fetched::ok(more).with_warning(format!("{first:#}"))),
            (Err(e), None) => {
                tracing::warn!(target: "feed", error = ?e, "newsapi broad search failed");
                Ok(Fetched::ok(items).with_warning(format!("{e:#}")))
            }
            (Err(_), Some(first)) => Err(first),
        }
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}

// src/feed/providers/rss.rs
//! Unauthenticated RSS/syndication news source (Google News search feed by
//! default). Same relevance rules as every other news provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;

use crate::error::CoreError;
use crate::extract::text::html_to_text;
use crate::feed::relevance::RelevanceFilter;
use crate::feed::types::{Fetched, NewsItem, NewsSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
    enclosure: Option<UrlAttr>,
    #[serde(rename = "media:content")]
    media: Option<UrlAttr>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlAttr {
    #[serde(rename = "@url")]
    url: Option<String>,
}

static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\b[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

/// Parse an RSS 2.0 document into news items.
pub fn parse_feed(xml: &str) -> Result<Vec<NewsItem>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let raw_desc = it.description.unwrap_or_default();
        let image = it
            .media
            .and_then(|m| m.url)
            .or_else(|| it.enclosure.and_then(|e| e.url))
            .or_else(|| {
                RE_IMG_SRC
                    .captures(&raw_desc)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            });
        let description = html_to_text(&raw_desc).replace('\n', " ");

        let Some(item) = NewsItem::new(
            &html_to_text(it.title.as_deref().unwrap_or_default()),
            &description,
            it.pub_date.as_deref().unwrap_or_default(),
        ) else {
            continue;
        };
        out.push(item.with_image(image.as_deref()).with_source(
            it.link.as_deref(),
            it.source.as_ref().and_then(|s| s.name.as_deref()),
        ));
    }

    histogram!("feed_parse_ms", "provider" => "rss").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

pub struct RssNewsProvider {
    client: reqwest::Client,
    url: String,
}

impl RssNewsProvider {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NewsSource for RssNewsProvider {
    async fn fetch_news(&self, _relevance: &RelevanceFilter) -> Result<Fetched<Vec<NewsItem>>> {
        let resp = self
            .client
            .get(&self.url)
            .header(
                reqwest::header::ACCEPT,
                "application/rss+xml,application/xml,text/xml,*/*",
            )
            .send()
            .await
            .map_err(CoreError::from)
            .context("rss get")?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(CoreError::UpstreamStatus { status }).context("rss get");
        }
        let body = resp.text().await.map_err(CoreError::from).context("rss body")?;
        Ok(Fetched {
            items: parse_feed(&body)?,
            http_status: Some(status),
            warning: None,
        })
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

// src/feed/providers/mod.rs
pub mod football_data;
pub mod newsapi;
pub mod rss;
pub mod scorebat;

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::feed::types::{MatchSource, NewsSource};

/// Build the news chain in configured order. Unknown names are skipped.
pub fn build_news_sources(cfg: &FeedConfig, client: &reqwest::Client) -> Vec<Arc<dyn NewsSource>> {
    cfg.news_providers
        .iter()
        .filter_map(|name| -> Option<Arc<dyn NewsSource>> {
            match name.as_str() {
                "newsapi" => Some(Arc::new(newsapi::NewsApiProvider::new(
                    client.clone(),
                    cfg.newsapi_base.clone(),
                    cfg.newsapi_key.clone(),
                    cfg.newsapi_broad_query.clone(),
                    cfg.newsapi_min_relevant,
                ))),
                "google_rss" | "rss" => Some(Arc::new(rss::RssNewsProvider::new(
                    client.clone(),
                    cfg.google_rss_url.clone(),
                ))),
                other => {
                    tracing::warn!(target: "feed", provider = other, "unknown news provider in config");
                    None
                }
            }
        })
        .collect()
}

/// Build the matches chain in configured order. Unknown names are skipped.
pub fn build_match_sources(cfg: &FeedConfig, client: &reqwest::Client) -> Vec<Arc<dyn MatchSource>> {
    cfg.match_providers
        .iter()
        .filter_map(|name| -> Option<Arc<dyn MatchSource>> {
            match name.as_str() {
                "football_data" => Some(Arc::new(football_data::FootballDataProvider::new(
                    client.clone(),
                    cfg.football_data_base.clone(),
                    cfg.football_data_key.clone(),
                ))),
                "scorebat" => Some(Arc::new(scorebat::ScoreBatProvider::new(
                    client.clone(),
                    cfg.scorebat_url.clone(),
                ))),
                other => {
                    tracing::warn!(target: "feed", provider = other, "unknown match provider in config");
                    None
                }
            }
        })
        .collect()
}

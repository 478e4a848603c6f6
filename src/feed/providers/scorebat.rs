// src/feed/providers/scorebat.rs
//! Unauthenticated highlights API. It has no status field, so kickoff
//! relative to "now" decides upcoming vs finished.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::CoreError;
use crate::feed::types::{Fetched, MatchItem, MatchSource, MatchStatus};

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    response: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    title: Option<String>,
    competition: Option<String>,
    date: Option<String>,
    matchview_url: Option<String>,
    url: Option<String>,
}

pub fn parse_videos(body: &str, now: DateTime<Utc>) -> Result<Vec<MatchItem>> {
    let resp: Response = serde_json::from_str(body).context("parsing scorebat json")?;
    Ok(resp
        .response
        .into_iter()
        .filter_map(|v| {
            let mut item = MatchItem::new(
                v.title.as_deref().unwrap_or_default(),
                v.date.as_deref().unwrap_or_default(),
                MatchStatus::Upcoming,
            )?;
            if item.kickoff_time < now {
                item.status = MatchStatus::Finished;
            }
            let url = v.matchview_url.as_deref().or(v.url.as_deref());
            Some(item.with_league(v.competition.as_deref()).with_url(url))
        })
        .collect())
}

pub struct ScoreBatProvider {
    client: reqwest::Client,
    url: String,
}

impl ScoreBatProvider {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MatchSource for ScoreBatProvider {
    async fn fetch_matches(&self) -> Result<Fetched<Vec<MatchItem>>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(CoreError::from)
            .context("scorebat get")?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(CoreError::UpstreamStatus { status }).context("scorebat get");
        }
        let body = resp
            .text()
            .await
            .map_err(CoreError::from)
            .context("scorebat body")?;
        Ok(Fetched {
            items: parse_videos(&body, Utc::now())?,
            http_status: Some(status),
            warning: None,
        })
    }

    fn name(&self) -> &'static str {
        "scorebat"
    }
}

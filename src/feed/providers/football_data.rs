// src/feed/providers/football_data.rs
//! Keyed fixtures API, queried once for [now - 24h, now + 7d].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::CoreError;
use crate::feed::types::{Fetched, MatchItem, MatchSource, MatchStatus};

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Match {
    home_team: Option<Team>,
    away_team: Option<Team>,
    utc_date: Option<String>,
    status: Option<String>,
    competition: Option<Competition>,
    score: Option<Score>,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Competition {
    name: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Score {
    full_time: Option<Goals>,
    half_time: Option<Goals>,
}

#[derive(Debug, Deserialize)]
struct Goals {
    home: Option<u32>,
    away: Option<u32>,
}

fn status_of(raw: &str) -> MatchStatus {
    match raw {
        "FINISHED" | "AWARDED" => MatchStatus::Finished,
        _ => MatchStatus::Upcoming,
    }
}

fn score_suffix(m: &Match, raw_status: &str) -> String {
    if !matches!(raw_status, "FINISHED" | "IN_PLAY" | "PAUSED") {
        return String::new();
    }
    let Some(score) = &m.score else {
        return String::new();
    };
    let goals = |g: &Option<Goals>| g.as_ref().and_then(|g| Some((g.home?, g.away?)));
    match goals(&score.full_time).or_else(|| goals(&score.half_time)) {
        Some((h, a)) => format!(" — {h}:{a}"),
        None => String::new(),
    }
}

/// Parse a `/v4/matches` body. Matches without both teams or a date are dropped.
pub fn parse_matches(body: &str) -> Result<Vec<MatchItem>> {
    let resp: Response = serde_json::from_str(body).context("parsing football-data json")?;
    Ok(resp
        .matches
        .iter()
        .filter_map(|m| {
            let home = m.home_team.as_ref()?.name.as_deref()?.trim();
            let away = m.away_team.as_ref()?.name.as_deref()?.trim();
            if home.is_empty() || away.is_empty() {
                return None;
            }
            let raw_status = m.status.as_deref().unwrap_or_default();
            let title = format!("{home} vs {away}{}", score_suffix(m, raw_status));
            let league = m.competition.as_ref().and_then(|c| {
                c.name
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .or(c.code.as_deref())
            });
            MatchItem::new(&title, m.utc_date.as_deref()?, status_of(raw_status))
                .map(|item| item.with_league(league))
        })
        .collect())
}

/// `(dateFrom, dateTo)` as `YYYY-MM-DD`, spanning 24h back to 7 days ahead.
pub fn date_window(now: DateTime<Utc>) -> (String, String) {
    let from = now - Duration::hours(24);
    let to = now + Duration::days(7);
    (
        from.format("%Y-%m-%d").to_string(),
        to.format("%Y-%m-%d").to_string(),
    )
}

pub struct FootballDataProvider {
    client: reqwest::Client,
    base: String,
    api_key: Option<String>,
}

impl FootballDataProvider {
    pub fn new(client: reqwest::Client, base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base: base.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MatchSource for FootballDataProvider {
    async fn fetch_matches(&self) -> Result<Fetched<Vec<MatchItem>>> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(CoreError::MissingCredential("football_data").into());
        };
        let (date_from, date_to) = date_window(Utc::now());
        let url = format!("{}/matches", self.base.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .header("X-Auth-Token", key)
            .query(&[("dateFrom", date_from.as_str()), ("dateTo", date_to.as_str())])
            .send()
            .await
            .map_err(CoreError::from)
            .context("football-data get")?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(CoreError::UpstreamStatus { status }).context("football-data get");
        }
        let body = resp
            .text()
            .await
            .map_err(CoreError::from)
            .context("football-data body")?;
        Ok(Fetched {
            items: parse_matches(&body)?,
            http_status: Some(status),
            warning: None,
        })
    }

    fn name(&self) -> &'static str {
        "football_data"
    }
}

// src/config.rs
//! Runtime configuration: `config/content.toml` (or `$CONTENT_CONFIG_PATH`)
//! for tunables, environment variables for secrets and deployment mode.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/content.toml";
pub const ENV_CONFIG_PATH: &str = "CONTENT_CONFIG_PATH";

const ENV_NEWS_KEYS: [&str; 2] = ["NEWSAPI_KEY", "NEWS_API_KEY"];
const ENV_FOOTBALL_KEYS: [&str; 2] = ["FOOTBALL_DATA_KEY", "FOOTBALLDATA_KEY"];
const ENV_REQUIRE_IMAGE: &str = "NEWS_REQUIRE_IMAGE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub extract: ExtractConfig,
    pub feed: FeedConfig,
    pub relevance: RelevanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub full_max_chars: usize,
    pub preview_max_chars: usize,
    pub fetch_timeout_ms: u64,
    pub readability_timeout_ms: u64,
    pub readability_base: String,
    pub max_html_bytes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            full_max_chars: 80_000,
            preview_max_chars: 12_000,
            fetch_timeout_ms: 10_000,
            readability_timeout_ms: 9_000,
            readability_base: "https://r.jina.ai/".to_string(),
            max_html_bytes: 3 * 1024 * 1024,
        }
    }
}

impl ExtractConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn readability_timeout(&self) -> Duration {
        Duration::from_millis(self.readability_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub provider_timeout_ms: u64,
    /// Ordered news chain; names: "newsapi", "google_rss".
    pub news_providers: Vec<String>,
    /// Ordered matches chain; names: "football_data", "scorebat".
    pub match_providers: Vec<String>,
    pub require_news_image: bool,
    pub newsapi_base: String,
    pub newsapi_broad_query: String,
    /// Below this many relevant headlines the broad query is merged in.
    pub newsapi_min_relevant: usize,
    pub google_rss_url: String,
    pub football_data_base: String,
    pub scorebat_url: String,
    /// Filled from the environment, never from the file.
    #[serde(skip)]
    pub newsapi_key: Option<String>,
    #[serde(skip)]
    pub football_data_key: Option<String>,
    #[serde(skip)]
    pub include_trace: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 10_000,
            news_providers: vec!["newsapi".into(), "google_rss".into()],
            match_providers: vec!["football_data".into(), "scorebat".into()],
            require_news_image: false,
            newsapi_base: "https://newsapi.org/v2".into(),
            newsapi_broad_query: "futebol OR basquete OR tênis OR fórmula 1 OR ufc OR vôlei OR champions OR libertadores OR nba".into(),
            newsapi_min_relevant: 6,
            google_rss_url: "https://news.google.com/rss/search?q=futebol&hl=pt-BR&gl=BR&ceid=BR:pt-419".into(),
            football_data_base: "https://api.football-data.org/v4".into(),
            scorebat_url: "https://www.scorebat.com/video-api/v3/".into(),
            newsapi_key: None,
            football_data_key: None,
            include_trace: false,
        }
    }
}

impl FeedConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub allow: Vec<String>,
    pub block: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        let allow = [
            "futebol", "gol", "gols", "campeonato", "liga", "libertadores", "brasileirão",
            "copa", "seleção", "jogo", "partida", "clube", "premier", "laliga", "la liga",
            "serie a", "bundesliga", "ligue 1", "champions", "nba", "basquete", "tênis",
            "tenis", "fórmula 1", "formula 1", "ufc", "mma", "vôlei", "volei", "boxe",
            "boxing", "elenco", "treinador", "técnico", "tático", "transferência",
            "contratação", "mercado da bola", "transfer", "aposta", "odds", "football",
            "soccer", "match",
        ];
        let block = [
            "hotel", "turismo", "viagem", "restaurante", "imóveis", "novela", "celebridade",
            "android", "iphone", "launcher", "linux", "criptomoeda", "criptomoedas",
            "bolsa de valores", "startup", "tecnologia", "internet",
            "inteligência artificial",
        ];
        Self {
            allow: allow.iter().map(|s| s.to_string()).collect(),
            block: block.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CoreConfig {
    /// Load from an explicit TOML path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading content config from {}", path.display()))?;
        let mut cfg = Self::parse(&content)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $CONTENT_CONFIG_PATH (must exist)
    /// 2) config/content.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = Self::default();
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: Self = toml::from_str(s).context("parsing content config toml")?;
        cfg.relevance.allow = clean_list(std::mem::take(&mut cfg.relevance.allow));
        cfg.relevance.block = clean_list(std::mem::take(&mut cfg.relevance.block));
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        self.feed.newsapi_key = first_env(&ENV_NEWS_KEYS);
        self.feed.football_data_key = first_env(&ENV_FOOTBALL_KEYS);
        if let Ok(v) = std::env::var(ENV_REQUIRE_IMAGE) {
            self.feed.require_news_image = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        self.feed.include_trace = !is_production();
    }
}

/// True when SHUTTLE_ENV or APP_ENV is `production`/`prod`.
pub fn is_production() -> bool {
    ["SHUTTLE_ENV", "APP_ENV"].iter().any(|k| {
        matches!(
            std::env::var(k)
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "production" | "prod"
        )
    })
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| std::env::var(n).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

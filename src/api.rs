// src/api.rs
//! HTTP surface: article extraction, sports feed, image proxy, health.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::extract::{ContentSource, Extractor, ViewMode};
use crate::extract::fetch::guarded_client;
use crate::feed::Aggregator;
use crate::proxy::{ImageProxy, MAX_IMAGE_BYTES};

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; AffiliateSiteBot/1.0)";

const ARTICLE_CACHE: &str = "public, s-maxage=3600, stale-while-revalidate=86400";
const FEED_CACHE: &str = "public, s-maxage=600, stale-while-revalidate=3600";
const IMAGE_CACHE: &str = "public, max-age=3600, s-maxage=3600, stale-while-revalidate=86400";

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub aggregator: Arc<Aggregator>,
    pub images: Arc<ImageProxy>,
}

impl AppState {
    pub fn new(extractor: Extractor, aggregator: Aggregator, images: ImageProxy) -> Self {
        Self {
            extractor: Arc::new(extractor),
            aggregator: Arc::new(aggregator),
            images: Arc::new(images),
        }
    }

    /// Production wiring: one shared reqwest client for every upstream.
    /// Redirects are followed only toward hosts the target guard accepts.
    pub fn from_config(cfg: &CoreConfig) -> Result<Self> {
        let client = guarded_client(USER_AGENT).context("building http client")?;
        Ok(Self::new(
            Extractor::from_config(cfg.extract.clone(), client.clone()),
            Aggregator::from_config(cfg, &client),
            ImageProxy::new(client, cfg.extract.fetch_timeout(), MAX_IMAGE_BYTES),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/article", get(article))
        .route("/api/football", get(football))
        .route("/api/img", get(image))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct ArticleQuery {
    url: Option<String>,
    mode: Option<String>,
}

#[derive(Serialize)]
struct ArticleResp {
    title: String,
    content: String,
    url: String,
    truncated: bool,
}

#[derive(Serialize)]
struct ArticleFailure {
    content: String,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

async fn article(State(state): State<AppState>, Query(q): Query<ArticleQuery>) -> Response {
    let mode = q.mode.as_deref().map(ViewMode::parse).unwrap_or_default();
    let raw = q.url.unwrap_or_default();

    match state.extractor.extract(&raw, mode).await {
        Ok(ex) if ex.source != ContentSource::Empty => (
            [(header::CACHE_CONTROL, ARTICLE_CACHE)],
            Json(ArticleResp {
                title: ex.result.title,
                content: ex.result.content,
                url: ex.url.to_string(),
                truncated: ex.result.truncated,
            }),
        )
            .into_response(),
        Ok(ex) => Json(ArticleFailure {
            content: String::new(),
            error: "upstream unavailable".to_string(),
            url: Some(ex.url.to_string()),
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ArticleFailure {
                content: String::new(),
                error: e.to_string(),
                url: None,
            }),
        )
            .into_response(),
    }
}

async fn football(State(state): State<AppState>) -> impl IntoResponse {
    let feed = state.aggregator.run().await;
    ([(header::CACHE_CONTROL, FEED_CACHE)], Json(feed))
}

#[derive(Deserialize)]
struct ImageQuery {
    url: Option<String>,
}

async fn image(State(state): State<AppState>, Query(q): Query<ImageQuery>) -> Response {
    let raw = q.url.unwrap_or_default();
    match state.images.fetch(&raw).await {
        Ok(img) => (
            [
                (header::CONTENT_TYPE, img.content_type),
                (header::CACHE_CONTROL, IMAGE_CACHE.to_string()),
            ],
            img.bytes,
        )
            .into_response(),
        Err(CoreError::InvalidInput(reason)) => (StatusCode::BAD_REQUEST, reason).into_response(),
        Err(CoreError::ContentTypeMismatch(_)) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Not an image").into_response()
        }
        Err(e) => {
            tracing::warn!(target: "api", kind = e.kind(), "image proxy upstream failed");
            (StatusCode::BAD_GATEWAY, "Upstream error").into_response()
        }
    }
}

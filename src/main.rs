//! Content acquisition service: binary entrypoint.
//! Boots the Axum HTTP server with article extraction, the sports feed,
//! the image proxy and the Prometheus endpoint.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use content_acquisition::api::{self, AppState};
use content_acquisition::config::CoreConfig;
use content_acquisition::logging;
use content_acquisition::metrics::Metrics;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Local .env carries the provider keys; no-op in prod.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = CoreConfig::load_default().context("loading content config")?;
    let state = AppState::from_config(&cfg)?;
    let mut router = api::router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed"),
    }

    tracing::info!(
        news = ?cfg.feed.news_providers,
        matches = ?cfg.feed.match_providers,
        "content service ready"
    );
    Ok(router.into())
}

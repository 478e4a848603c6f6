// src/error.rs
//! Failure taxonomy shared by the extraction and aggregation pipelines.
//!
//! Only `InvalidInput` ever reaches a caller as a hard failure; everything else
//! is folded into an empty result or a trace entry at the component boundary.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad or disallowed URL. Rejected before any upstream call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected content type: {0}")]
    ContentTypeMismatch(String),

    #[error("upstream body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("missing credential for {0}")]
    MissingCredential(&'static str),

    #[error("parse anomaly: {0}")]
    ParseAnomaly(String),
}

impl CoreError {
    /// Soft failures: the upstream could not give us anything usable.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamStatus { .. }
                | Self::Timeout(_)
                | Self::Network(_)
                | Self::ContentTypeMismatch(_)
                | Self::BodyTooLarge(_)
        )
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short, stable label for logs, metrics and the feed trace.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::ContentTypeMismatch(_) => "content_type",
            Self::BodyTooLarge(_) => "too_large",
            Self::MissingCredential(_) => "missing_credential",
            Self::ParseAnomaly(_) => "parse",
        }
    }
}

/// Run `fut` under a hard deadline; elapsed deadline maps to `CoreError::Timeout`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, CoreError>
where
    F: std::future::Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(CoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_grouping() {
        assert!(CoreError::UpstreamStatus { status: 503 }.is_upstream());
        assert!(CoreError::Timeout(Duration::from_secs(1)).is_upstream());
        assert!(CoreError::ContentTypeMismatch("application/pdf".into()).is_upstream());
        assert!(CoreError::BodyTooLarge(1024).is_upstream());
        assert!(!CoreError::InvalidInput("ftp".into()).is_upstream());
        assert!(!CoreError::MissingCredential("newsapi").is_upstream());
    }

    #[test]
    fn status_is_exposed_for_trace() {
        assert_eq!(
            CoreError::UpstreamStatus { status: 429 }.http_status(),
            Some(429)
        );
        assert_eq!(CoreError::ParseAnomaly("x".into()).http_status(), None);
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout() {
        let res: Result<(), CoreError> = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(CoreError::Timeout(_))));
    }
}

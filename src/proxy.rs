// src/proxy.rs
//! Pass-through image proxy so the UI never hotlinks third-party images.

use std::time::Duration;

use crate::error::{with_deadline, CoreError};
use crate::extract::fetch::{read_capped, validate_target};

/// Images larger than this are refused rather than served cut short.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProxiedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ImageProxy {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl ImageProxy {
    pub fn new(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Fetch an image. `InvalidInput` for disallowed URLs,
    /// `ContentTypeMismatch` for non-image bodies, `BodyTooLarge` past the
    /// byte cap, upstream errors otherwise.
    pub async fn fetch(&self, raw_url: &str) -> Result<ProxiedImage, CoreError> {
        let url = validate_target(raw_url)?;
        with_deadline(self.timeout, async {
            let mut resp = self
                .client
                .get(url.as_str())
                .header(
                    reqwest::header::ACCEPT,
                    "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
                )
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(CoreError::UpstreamStatus {
                    status: resp.status().as_u16(),
                });
            }
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("image/jpeg")
                .to_string();
            if !content_type.to_ascii_lowercase().starts_with("image/") {
                return Err(CoreError::ContentTypeMismatch(content_type));
            }
            if resp.content_length().map_or(false, |n| n > self.max_bytes as u64) {
                return Err(CoreError::BodyTooLarge(self.max_bytes));
            }
            let (bytes, truncated) = read_capped(&mut resp, self.max_bytes).await?;
            if truncated {
                return Err(CoreError::BodyTooLarge(self.max_bytes));
            }
            Ok(ProxiedImage { content_type, bytes })
        })
        .await
    }
}

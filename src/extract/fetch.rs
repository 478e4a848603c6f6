// src/extract/fetch.rs
//! Target validation and the direct HTML fetch.

use async_trait::async_trait;
use metrics::histogram;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use url::{Host, Url};

use crate::error::{with_deadline, CoreError};

/// One fetched page. Lives for a single request.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub url: Url,
    pub raw_bytes: Vec<u8>,
    pub content_type: String,
}

impl SourceDocument {
    pub fn html(&self) -> String {
        String::from_utf8_lossy(&self.raw_bytes).into_owned()
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<SourceDocument, CoreError>;
}

/// Parse and vet a user-supplied URL: absolute, http(s), public host.
pub fn validate_target(raw: &str) -> Result<Url, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::InvalidInput("missing url".into()));
    }
    let url = Url::parse(raw).map_err(|e| CoreError::InvalidInput(format!("bad url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoreError::InvalidInput(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    match url.host() {
        None => return Err(CoreError::InvalidInput("url has no host".into())),
        Some(host) if is_private_host(&host) => {
            return Err(CoreError::InvalidInput("host not allowed".into()))
        }
        Some(_) => {}
    }
    Ok(url)
}

/// Loopback, private, link-local and similar hosts. Name-based only; no DNS.
pub fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Ipv4(ip) => is_private_v4(ip),
        Host::Ipv6(ip) => is_private_v6(ip),
        Host::Domain(d) => {
            let d = d.trim_end_matches('.').to_ascii_lowercase();
            // Url keeps some numeric hosts as domains; re-check those.
            if let Ok(ip) = d.parse::<IpAddr>() {
                return match ip {
                    IpAddr::V4(v4) => is_private_v4(&v4),
                    IpAddr::V6(v6) => is_private_v6(&v6),
                };
            }
            d == "localhost"
                || d.ends_with(".localhost")
                || d.ends_with(".local")
                || d.ends_with(".internal")
        }
    }
}

fn is_private_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // 100.64.0.0/10 carrier-grade NAT
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xC0) == 64)
}

fn is_private_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(&v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00 // unique local
        || (first & 0xffc0) == 0xfe80 // link local
}

pub const MAX_REDIRECTS: usize = 5;

/// Redirect policy that re-applies the host guard to every hop. A redirect to
/// a private host or a non-http(s) scheme fails the request.
pub fn guarded_redirect_policy() -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let next = attempt.url();
        let refusal = if !matches!(next.scheme(), "http" | "https") {
            Some(format!("redirect to unsupported scheme: {}", next.scheme()))
        } else if next.host().map_or(true, |h| is_private_host(&h)) {
            Some(format!("redirect to disallowed host: {}", next.host_str().unwrap_or_default()))
        } else {
            None
        };
        match refusal {
            Some(reason) => attempt.error(reason),
            None => attempt.follow(),
        }
    })
}

/// Shared upstream client: fixed user agent, guarded redirects.
pub fn guarded_client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(guarded_redirect_policy())
        .build()
}

/// Read at most `max_bytes` of the body, chunk by chunk, and stop there.
/// The flag is set when the body was cut short.
pub async fn read_capped(
    resp: &mut reqwest::Response,
    max_bytes: usize,
) -> Result<(Vec<u8>, bool), CoreError> {
    let mut buf = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = max_bytes - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            let cut = chunk.len() > room
                || resp.content_length().map_or(false, |n| n > max_bytes as u64);
            return Ok((buf, cut));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((buf, false))
}

/// reqwest-backed fetcher with a hard deadline, a byte cap, and an HTML
/// content-type requirement.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }
}

pub fn is_html_content_type(ct: &str) -> bool {
    let ct = ct.to_ascii_lowercase();
    ct.starts_with("text/html") || ct.starts_with("application/xhtml+xml")
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<SourceDocument, CoreError> {
        let t0 = std::time::Instant::now();
        let doc = with_deadline(self.timeout, async {
            let mut resp = self
                .client
                .get(url.as_str())
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5",
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
                .unwrap_or_default()
                .to_string();
            if !is_html_content_type(&content_type) {
                return Err(CoreError::ContentTypeMismatch(content_type));
            }
            let (raw_bytes, truncated) = read_capped(&mut resp, self.max_bytes).await?;
            if truncated {
                tracing::debug!(target: "extract", max_bytes = self.max_bytes, "page body cut at byte cap");
            }
            Ok(SourceDocument {
                url: url.clone(),
                raw_bytes,
                content_type,
            })
        })
        .await;
        histogram!("extract_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_public_http_and_https() {
        assert!(validate_target("https://ge.globo.com/futebol/").is_ok());
        assert!(validate_target(" http://example.com/a?b=c ").is_ok());
    }

    #[test]
    fn rejects_malformed_and_other_schemes() {
        for bad in ["", "not a url", "/relative/path", "ftp://example.com/x", "javascript:alert(1)", "file:///etc/passwd"] {
            assert!(
                matches!(validate_target(bad), Err(CoreError::InvalidInput(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_private_hosts() {
        for bad in [
            "http://localhost:3000/",
            "http://127.0.0.1/",
            "http://10.1.2.3/",
            "http://192.168.0.10/x",
            "http://172.16.5.4/",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[::ffff:127.0.0.1]/",
            "http://printer.local/",
            "http://api.localhost/",
            "http://metadata.internal/",
        ] {
            assert!(
                matches!(validate_target(bad), Err(CoreError::InvalidInput(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn html_content_types() {
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type(""));
    }
}

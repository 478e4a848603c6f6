// tests/extract_pipeline.rs
//
// End-to-end extraction with in-memory fetcher/readability doubles.
// No sockets: every upstream is a trait object.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use content_acquisition::config::ExtractConfig;
use content_acquisition::extract::fetch::{PageFetcher, SourceDocument};
use content_acquisition::extract::readability::{Readability, RemoteText};
use content_acquisition::extract::{ContentSource, Extractor, ViewMode};
use content_acquisition::CoreError;

struct StaticFetcher {
    html: Option<String>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    fn serving(html: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            html: Some(html.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            html: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<SourceDocument, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.html {
            Some(h) => Ok(SourceDocument {
                url: url.clone(),
                raw_bytes: h.clone().into_bytes(),
                content_type: "text/html; charset=utf-8".into(),
            }),
            None => Err(CoreError::UpstreamStatus { status: 503 }),
        }
    }
}

struct CountingReadability {
    reply: Option<RemoteText>,
    calls: AtomicUsize,
}

impl CountingReadability {
    fn answering(title: &str, content: String) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(RemoteText {
                title: Some(title.to_string()),
                content,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Readability for CountingReadability {
    async fn fetch_text(&self, _target: &Url) -> Result<RemoteText, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or(CoreError::Timeout(std::time::Duration::from_secs(9)))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn prose_article() -> (String, String) {
    let sentence = "O Flamengo venceu o Palmeiras por dois a um no Maracanã lotado nesta noite. ";
    let body = sentence.repeat(26);
    let html = format!(
        r#"<html><head><title>Clássico no Rio</title></head><body>
<header><a href="/">Portal</a></header>
<nav><ul><li><a href="/a">Esportes</a></li><li><a href="/b">Política</a></li></ul></nav>
<article><h1>Clássico no Rio</h1><p>{body}<a href="/t1">Tabela</a> e <a href="/t2">Artilharia</a>.</p></article>
<footer>Todos os direitos reservados</footer>
</body></html>"#
    );
    (html, body.trim().to_string())
}

fn link_page() -> String {
    let items: String = (1..=40)
        .map(|i| format!(r#"<li><a href="/s/{i}">Seção {i}</a></li>"#))
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

#[tokio::test]
async fn article_block_wins_without_remote_call() {
    let (html, body) = prose_article();
    let remote = CountingReadability::answering("x", "y".repeat(5000));
    let ex = Extractor::new(ExtractConfig::default(), StaticFetcher::serving(html), remote.clone());

    let out = ex
        .extract("https://esporte.example.com/jogo", ViewMode::Full)
        .await
        .expect("valid url");

    assert_eq!(out.source, ContentSource::Local);
    assert_eq!(remote.calls(), 0, "gate passed, no fallback expected");
    assert!(out.result.content.starts_with("Clássico no Rio"));
    assert!(out.result.content.contains(&body));
    assert!(!out.result.content.contains("Política"));
    assert!(!out.result.content.contains("direitos reservados"));
    assert_eq!(out.result.title, "Clássico no Rio");
    assert!(!out.result.truncated);
}

#[tokio::test]
async fn link_page_falls_back_to_remote_text() {
    let remote_text = "Texto limpo do leitor remoto. ".repeat(50);
    let remote_text = remote_text.trim().to_string();
    let remote = CountingReadability::answering("Título remoto", remote_text.clone());
    let ex = Extractor::new(
        ExtractConfig::default(),
        StaticFetcher::serving(link_page()),
        remote.clone(),
    );

    let out = ex
        .extract("https://portal.example.com/", ViewMode::Full)
        .await
        .unwrap();

    assert_eq!(remote.calls(), 1);
    assert_eq!(out.source, ContentSource::Remote);
    assert_eq!(out.result.content, remote_text);
    assert_eq!(out.result.title, "Título remoto");
}

#[tokio::test]
async fn shorter_remote_text_does_not_replace_local() {
    let remote = CountingReadability::answering("r", "curto".to_string());
    let ex = Extractor::new(
        ExtractConfig::default(),
        StaticFetcher::serving(link_page()),
        remote.clone(),
    );

    let out = ex.extract("https://portal.example.com/", ViewMode::Full).await.unwrap();

    assert_eq!(remote.calls(), 1);
    assert_eq!(out.source, ContentSource::Local);
    assert!(out.result.content.contains("Seção 1"));
}

#[tokio::test]
async fn direct_fetch_failure_still_tries_remote() {
    let remote = CountingReadability::answering("r", "Conteúdo remoto completo.".repeat(10));
    let ex = Extractor::new(ExtractConfig::default(), StaticFetcher::failing(), remote.clone());

    let out = ex.extract("https://bloqueado.example.com/x", ViewMode::Full).await.unwrap();

    assert_eq!(remote.calls(), 1);
    assert_eq!(out.source, ContentSource::Remote);
    assert!(!out.result.content.is_empty());
}

#[tokio::test]
async fn everything_down_yields_empty_content_not_error() {
    let remote = CountingReadability::down();
    let ex = Extractor::new(ExtractConfig::default(), StaticFetcher::failing(), remote.clone());

    let out = ex.extract("https://fora.example.com/", ViewMode::Preview).await.unwrap();

    assert_eq!(out.source, ContentSource::Empty);
    assert_eq!(out.result.content, "");
    assert_eq!(out.result.title, "");
    assert!(!out.result.truncated);
}

#[tokio::test]
async fn preview_mode_clamps_to_configured_bound() {
    let cfg = ExtractConfig {
        preview_max_chars: 300,
        ..ExtractConfig::default()
    };
    let remote = CountingReadability::answering("r", "palavra ".repeat(2000));
    let ex = Extractor::new(cfg, StaticFetcher::serving(link_page()), remote);

    let preview = ex.extract("https://portal.example.com/", ViewMode::Preview).await.unwrap();
    assert!(preview.result.truncated);
    assert!(preview.result.content.chars().count() <= 300);
    assert!(preview.result.content.ends_with('…'));
    assert!(preview.result.content.trim_end_matches('…').ends_with("palavra"));

    let full = ex.extract("https://portal.example.com/", ViewMode::Full).await.unwrap();
    assert!(!full.result.truncated);
}

#[tokio::test]
async fn same_input_same_output() {
    let (html, _) = prose_article();
    let ex = Extractor::new(
        ExtractConfig::default(),
        StaticFetcher::serving(html),
        CountingReadability::down(),
    );
    let a = ex.extract("https://esporte.example.com/jogo", ViewMode::Full).await.unwrap();
    let b = ex.extract("https://esporte.example.com/jogo", ViewMode::Full).await.unwrap();
    assert_eq!(a.result, b.result);
}

#[tokio::test]
async fn rejected_urls_never_reach_upstreams() {
    let fetcher = StaticFetcher::serving("<p>x</p>");
    let remote = CountingReadability::down();
    let ex = Extractor::new(ExtractConfig::default(), fetcher.clone(), remote.clone());

    for bad in [
        "",
        "not a url",
        "ftp://example.com/file",
        "http://127.0.0.1/admin",
        "http://localhost:8080/",
        "http://10.0.0.5/",
        "http://[::1]/",
    ] {
        let err = ex.extract(bad, ViewMode::Full).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "{bad}: {err}");
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(remote.calls(), 0);
}

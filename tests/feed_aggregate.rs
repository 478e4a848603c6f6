// tests/feed_aggregate.rs
//
// Aggregator behaviour over stub providers: fallback order, fault isolation,
// relevance filtering, ordering and the optional trace.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use content_acquisition::feed::providers::newsapi::NewsApiProvider;
use content_acquisition::feed::relevance::RelevanceFilter;
use content_acquisition::feed::types::{
    Fetched, MatchItem, MatchSource, MatchStatus, NewsItem, NewsSource,
};
use content_acquisition::feed::{Aggregator, MAX_NEWS, PLACEHOLDER_NEWS_TITLE};
use content_acquisition::CoreError;

struct StubNews {
    name: &'static str,
    items: Option<Vec<NewsItem>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubNews {
    fn with(name: &'static str, items: Vec<NewsItem>) -> Arc<Self> {
        Arc::new(Self {
            name,
            items: Some(items),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn broken(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            items: None,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            items: Some(vec![news("Gol no último minuto decide o jogo")]),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl NewsSource for StubNews {
    async fn fetch_news(&self, _relevance: &RelevanceFilter) -> anyhow::Result<Fetched<Vec<NewsItem>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match &self.items {
            Some(v) => Ok(Fetched::ok(v.clone())),
            None => Err(CoreError::UpstreamStatus { status: 500 }.into()),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

struct StubMatches {
    name: &'static str,
    items: Option<Vec<MatchItem>>,
}

impl StubMatches {
    fn with(name: &'static str, items: Vec<MatchItem>) -> Arc<dyn MatchSource> {
        Arc::new(Self {
            name,
            items: Some(items),
        })
    }

    fn broken(name: &'static str) -> Arc<dyn MatchSource> {
        Arc::new(Self { name, items: None })
    }
}

#[async_trait]
impl MatchSource for StubMatches {
    async fn fetch_matches(&self) -> anyhow::Result<Fetched<Vec<MatchItem>>> {
        match &self.items {
            Some(v) => Ok(Fetched::ok(v.clone())),
            None => Err(CoreError::Timeout(Duration::from_secs(10)).into()),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn dyn_news(s: Arc<StubNews>) -> Arc<dyn NewsSource> {
    s
}

fn news(title: &str) -> NewsItem {
    NewsItem::new(title, "Resumo da rodada do campeonato", "2024-05-01T10:00:00Z")
        .expect("valid news item")
        .with_source(Some("https://esporte.example.com/n"), Some("Portal"))
}

fn fixture(title: &str, ts: &str, status: MatchStatus) -> MatchItem {
    MatchItem::new(title, ts, status).expect("valid match")
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn relevant_three() -> Vec<NewsItem> {
    vec![
        news("Flamengo vence clássico no futebol carioca"),
        news("Palmeiras lidera o campeonato"),
        news("Seleção convoca novos nomes para a Copa"),
    ]
}

#[tokio::test]
async fn missing_credential_skips_to_next_news_provider() {
    let keyless: Arc<dyn NewsSource> = Arc::new(NewsApiProvider::new(
        reqwest::Client::new(),
        "https://newsapi.invalid/v2",
        None,
        "futebol",
        6,
    ));
    let backup = StubNews::with("rss", relevant_three());
    let agg = Aggregator::new(vec![keyless, dyn_news(backup)], vec![], RelevanceFilter::default())
        .with_trace(true);

    let feed = agg.run_at(now()).await;

    assert_eq!(feed.news.len(), 3);
    let trace = feed.trace.expect("trace enabled");
    assert_eq!(trace[0].provider_name, "newsapi");
    assert!(!trace[0].success);
    assert!(trace[0]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("missing credential"));
    assert_eq!(trace[1].provider_name, "rss");
    assert!(trace[1].success);
    assert_eq!(trace[1].item_count, 3);
}

#[tokio::test]
async fn empty_match_providers_give_empty_lists() {
    let agg = Aggregator::new(
        vec![],
        vec![StubMatches::with("a", vec![]), StubMatches::with("b", vec![])],
        RelevanceFilter::default(),
    );

    let feed = agg.run_at(now()).await;

    assert!(feed.next_matches.is_empty());
    assert!(feed.last_results.is_empty());
    assert_eq!(feed.news.len(), 1);
    assert_eq!(feed.news[0].title, PLACEHOLDER_NEWS_TITLE);
    assert_eq!(feed.featured.title, "Destaque do esporte");
}

#[tokio::test]
async fn first_successful_provider_wins_and_later_ones_are_not_called() {
    let first = StubNews::with("a", relevant_three());
    let second = StubNews::with("b", vec![news("Outro gol")]);
    let agg = Aggregator::new(
        vec![dyn_news(first.clone()), dyn_news(second.clone())],
        vec![],
        RelevanceFilter::default(),
    );

    let feed = agg.run_at(now()).await;

    assert_eq!(feed.news.len(), 3);
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    assert_eq!(feed.news[0].title, "Flamengo vence clássico no futebol carioca");
}

#[tokio::test]
async fn failing_and_irrelevant_providers_fall_through() {
    let broken = StubNews::broken("broken");
    let offtopic = StubNews::with(
        "offtopic",
        vec![
            NewsItem::new("Novo hotel abre em Gramado", "Turismo na serra", "2024-05-01T10:00:00Z")
                .unwrap(),
            NewsItem::new("Bolsa fecha em alta", "Mercado financeiro", "2024-05-01T10:00:00Z")
                .unwrap(),
        ],
    );
    let good = StubNews::with("good", relevant_three());
    let agg = Aggregator::new(
        vec![dyn_news(broken), dyn_news(offtopic), dyn_news(good)],
        vec![],
        RelevanceFilter::default(),
    )
    .with_trace(true);

    let feed = agg.run_at(now()).await;

    assert_eq!(feed.news.len(), 3);
    let trace = feed.trace.unwrap();
    let names: Vec<_> = trace.iter().map(|a| a.provider_name.as_str()).collect();
    assert_eq!(names, vec!["broken", "offtopic", "good"]);
    assert_eq!(trace[0].http_status, Some(500));
    assert!(trace[1].success);
    assert_eq!(trace[1].item_count, 0);
}

#[tokio::test]
async fn slow_provider_times_out_and_is_recorded() {
    let slow = StubNews::slow("slow", Duration::from_millis(500));
    let good = StubNews::with("good", relevant_three());
    let agg = Aggregator::new(vec![dyn_news(slow), dyn_news(good)], vec![], RelevanceFilter::default())
        .with_timeout(Duration::from_millis(50))
        .with_trace(true);

    let feed = agg.run_at(now()).await;

    assert_eq!(feed.news.len(), 3);
    let trace = feed.trace.unwrap();
    assert!(!trace[0].success);
    assert!(trace[0].error.as_deref().unwrap_or_default().contains("timed out"));
}

#[tokio::test]
async fn news_is_deduplicated_and_capped() {
    let mut items: Vec<NewsItem> = (1..=12)
        .map(|i| news(&format!("Rodada {i} do campeonato")))
        .collect();
    items.insert(1, news("RODADA 1 DO CAMPEONATO"));
    let agg = Aggregator::new(
        vec![dyn_news(StubNews::with("a", items))],
        vec![],
        RelevanceFilter::default(),
    );

    let feed = agg.run_at(now()).await;

    assert_eq!(feed.news.len(), MAX_NEWS);
    assert_eq!(feed.news[0].title, "Rodada 1 do campeonato");
    assert_eq!(feed.news[1].title, "Rodada 2 do campeonato");
}

#[tokio::test]
async fn image_requirement_is_optional() {
    let with_img = news("Gol de placa no clássico").with_image(Some("https://img.example.com/1.jpg"));
    let items = vec![news("Gol sem foto no clássico"), with_img];

    let lenient = Aggregator::new(
        vec![dyn_news(StubNews::with("a", items.clone()))],
        vec![],
        RelevanceFilter::default(),
    );
    assert_eq!(lenient.run_at(now()).await.news.len(), 2);

    let strict = Aggregator::new(
        vec![dyn_news(StubNews::with("a", items))],
        vec![],
        RelevanceFilter::default(),
    )
    .with_require_image(true);
    let feed = strict.run_at(now()).await;
    assert_eq!(feed.news.len(), 1);
    assert_eq!(feed.news[0].title, "Gol de placa no clássico");
}

#[tokio::test]
async fn matches_are_split_ordered_and_featured() {
    let items = vec![
        fixture("C vs D", "2024-05-03T20:00:00Z", MatchStatus::Upcoming),
        fixture("A vs B", "2024-05-02T19:30:00Z", MatchStatus::Upcoming).with_league(Some("Série A")),
        fixture("E vs F — 1:0", "2024-04-29T18:00:00Z", MatchStatus::Finished),
        fixture("G vs H — 2:2", "2024-04-30T18:00:00Z", MatchStatus::Finished),
    ];
    let agg = Aggregator::new(
        vec![],
        vec![StubMatches::broken("down"), StubMatches::with("up", items)],
        RelevanceFilter::default(),
    );

    let feed = agg.run_at(now()).await;

    let next: Vec<_> = feed.next_matches.iter().map(|m| m.title.as_str()).collect();
    let last: Vec<_> = feed.last_results.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(next, vec!["A vs B", "C vs D"]);
    assert_eq!(last, vec!["G vs H — 2:2", "E vs F — 1:0"]);
    assert_eq!(feed.featured.title, "Destaque: A vs B");
    assert_eq!(feed.featured.subtitle, "02/05 19:30 UTC • Série A");
}

#[tokio::test]
async fn trace_is_omitted_when_disabled() {
    let agg = Aggregator::new(
        vec![dyn_news(StubNews::broken("a"))],
        vec![StubMatches::broken("b")],
        RelevanceFilter::default(),
    );

    let feed = agg.run_at(now()).await;
    assert!(feed.trace.is_none());

    let json = serde_json::to_value(&feed).unwrap();
    assert!(json.get("trace").is_none());
    assert!(json.get("nextMatches").is_some());
    assert!(json.get("lastResults").is_some());
    assert!(json["news"][0].get("publishedAt").is_some());
}

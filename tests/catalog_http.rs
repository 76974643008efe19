//! End-to-end catalog tests.
//!
//! Spawns the in-memory reference service on an ephemeral port and drives it
//! through the HTTP client, the same way the CLI does.

use std::sync::Arc;

use ratebook::catalog::{Catalog, ConversionForm, InvalidationScope};
use ratebook::client::{HttpExtractionService, ServiceConfig};
use ratebook::error::{CatalogError, ErrorKind, ValidationError};
use ratebook::models::{ConversionItem, ScrapeRequest, Table, UpsertRequest};
use ratebook::server::{create_router, AppState, MemoryBackend};
use ratebook::store::ExtractedRate;

const GEMS: &str = "https://example.com/currencies/gems";
const MYTHICAL: &str = "https://example.com/currencies/gems/mythical";

struct TestService {
    backend: Arc<MemoryBackend>,
    catalog: Catalog,
}

async fn spawn_service(backend: MemoryBackend) -> TestService {
    let state = AppState::new(backend);
    let backend = state.backend.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ServiceConfig::default().with_backend_url(&format!("http://{}", addr));
    let service = HttpExtractionService::new(config).unwrap();
    TestService {
        backend,
        catalog: Catalog::new(service),
    }
}

async fn gems_service() -> TestService {
    let backend = MemoryBackend::new();
    backend
        .add_page(
            GEMS,
            Some("Gem Exchange"),
            vec![
                Table::new(
                    vec![],
                    vec![
                        vec!["Gem".into(), "Coin".into(), "120".into()],
                        vec!["Ruby".into(), "Coin".into(), "45".into()],
                    ],
                ),
                Table::default(),
            ],
        )
        .await;
    backend.add_page(MYTHICAL, Some("Mythical Gems"), vec![]).await;
    spawn_service(backend).await
}

fn gem_coin(rate: f64) -> UpsertRequest {
    UpsertRequest::single(GEMS, None, ConversionItem::new("Gem", "Coin", rate))
}

#[tokio::test]
async fn test_upsert_round_trip() {
    let svc = gems_service().await;

    let outcome = svc.catalog.upsert(&gem_coin(120.0)).await.unwrap();
    assert_eq!(outcome.saved.len(), 1);
    assert!(!outcome.refreshed.is_failed());

    let listing = svc.catalog.list_conversions(Some(GEMS)).await;
    assert_eq!(listing.len(), 1);
    let record = &listing.items[0];
    assert_eq!(record.source, "Gem");
    assert_eq!(record.target, "Coin");
    assert_eq!(record.rate, 120.0);
    assert!(record.text.is_none());
    assert_eq!(record.page_url.as_deref(), Some(GEMS));
}

#[tokio::test]
async fn test_case_insensitive_correction_keeps_size() {
    let svc = gems_service().await;
    svc.catalog.upsert(&gem_coin(120.0)).await.unwrap();

    let correction =
        UpsertRequest::single(GEMS, None, ConversionItem::new("gem", "COIN", 150.0));
    let outcome = svc.catalog.upsert(&correction).await.unwrap();

    assert_eq!(outcome.refreshed.len(), 1);
    assert_eq!(outcome.refreshed.items[0].rate, 150.0);
    assert_eq!(svc.backend.record_count().await, 1);
}

#[tokio::test]
async fn test_new_pair_adds_exactly_one() {
    let svc = gems_service().await;
    svc.catalog.upsert(&gem_coin(120.0)).await.unwrap();

    let ruby = UpsertRequest::single(GEMS, None, ConversionItem::new("Ruby", "Coin", 45.0));
    let outcome = svc.catalog.upsert(&ruby).await.unwrap();

    assert_eq!(outcome.refreshed.len(), 2);
    let sources: Vec<_> = outcome.refreshed.items.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["Gem", "Ruby"]);
}

#[tokio::test]
async fn test_filter_never_returns_other_pages() {
    let svc = gems_service().await;
    svc.catalog.upsert(&gem_coin(120.0)).await.unwrap();
    svc.catalog
        .upsert(&UpsertRequest::single(
            MYTHICAL,
            None,
            ConversionItem::new("Dragon Gem", "Coin", 9000.0),
        ))
        .await
        .unwrap();

    let gems = svc.catalog.list_conversions(Some(GEMS)).await;
    assert!(gems.items.iter().all(|r| r.page_url.as_deref() == Some(GEMS)));
    assert_eq!(gems.len(), 1);

    let all = svc.catalog.list_conversions(None).await;
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_form_validation_sends_nothing() {
    let svc = gems_service().await;

    let cases = [
        ("", "Gem", "Coin", "120"),
        (GEMS, "", "Coin", "120"),
        (GEMS, "Gem", "  ", "120"),
        (GEMS, "Gem", "Coin", "0"),
        (GEMS, "Gem", "Coin", "-5"),
        (GEMS, "Gem", "Coin", "lots"),
    ];
    for (page_url, source, target, rate) in cases {
        let form = ConversionForm {
            page_url: page_url.into(),
            page_title: String::new(),
            source: source.into(),
            target: target.into(),
            rate: rate.into(),
        };
        let err = svc.catalog.submit(form).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "case {:?}", rate);
    }

    assert_eq!(svc.backend.record_count().await, 0);
}

#[tokio::test]
async fn test_validation_happens_before_transport() {
    // Nothing listens on port 1; only a request would surface as transport.
    let config = ServiceConfig::default().with_backend_url("http://127.0.0.1:1");
    let catalog = Catalog::new(HttpExtractionService::new(config).unwrap());

    let err = catalog.upsert(&gem_coin(0.0)).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::InvalidRate(_))
    ));

    let err = catalog.upsert(&gem_coin(120.0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    let listing = catalog.list_conversions(Some(GEMS)).await;
    assert!(listing.is_failed());
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_service_detail_is_verbatim() {
    let svc = gems_service().await;

    let missing = "https://example.com/currencies/missing";
    match svc.catalog.get_page(missing).await {
        Err(CatalogError::Service { status, detail }) => {
            assert_eq!(status, Some(404));
            assert_eq!(detail, format!("Page not found: {}", missing));
        }
        other => panic!("unexpected: {:?}", other),
    }

    let err = svc
        .catalog
        .scrape(&ScrapeRequest::new("https://example.com"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Scraping is not available on the in-memory service"
    );
}

#[tokio::test]
async fn test_page_tables_and_synthesized_headers() {
    let svc = gems_service().await;

    let detail = svc.catalog.get_page(GEMS).await.unwrap();
    assert_eq!(detail.page.title.as_deref(), Some("Gem Exchange"));
    assert_eq!(detail.page.path, "/currencies/gems");
    assert_eq!(detail.tables.len(), 2);
    assert_eq!(
        detail.tables[0].effective_headers(),
        vec!["Col 1", "Col 2", "Col 3"]
    );

    // The empty table is not rendered.
    assert_eq!(detail.visible_tables().count(), 1);

    let pages = svc.catalog.list_pages(Some("mythical")).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].url, MYTHICAL);
}

#[tokio::test]
async fn test_open_page_keeps_rates_when_page_fails() {
    let svc = gems_service().await;
    svc.catalog
        .upsert(&UpsertRequest::single(
            "https://example.com/unstored",
            Some("Unstored"),
            ConversionItem::new("Gem", "Coin", 100.0),
        ))
        .await
        .unwrap();

    let view = svc.catalog.open_page("https://example.com/unstored").await;
    assert!(view.page.is_err());
    assert_eq!(view.rates.len(), 1);
}

#[tokio::test]
async fn test_extraction_then_manual_correction() {
    let svc = gems_service().await;
    svc.backend
        .stage_extraction(
            GEMS,
            vec![ExtractedRate {
                source: "Gem".into(),
                target: "Coin".into(),
                rate: 100.0,
                text: "1 Gem = 100 Coins".into(),
            }],
            vec![ExtractedRate {
                source: "Ruby".into(),
                target: "Gem".into(),
                rate: 3.0,
                text: "ruby_icon.png: 3 gems".into(),
            }],
        )
        .await;

    let mut invalidations = svc.catalog.subscribe();

    let outcome = svc.catalog.request_extraction(GEMS, false).await.unwrap();
    assert_eq!(outcome.response["found"], 1);
    assert_eq!(outcome.refreshed.len(), 1);
    assert_eq!(
        outcome.refreshed.items[0].text.as_deref(),
        Some("1 Gem = 100 Coins")
    );

    assert!(invalidations.has_changed().unwrap());
    let seen = invalidations.borrow_and_update().clone();
    assert!(matches!(seen.scope, InvalidationScope::Page(_)));
    assert!(seen.affects(GEMS));

    let with_ocr = svc.catalog.request_extraction(GEMS, true).await.unwrap();
    assert_eq!(with_ocr.refreshed.len(), 2);

    // A manual correction replaces the rate and drops the snippet.
    let outcome = svc.catalog.upsert(&gem_coin(120.0)).await.unwrap();
    let gem = outcome
        .refreshed
        .items
        .iter()
        .find(|r| r.source == "Gem")
        .unwrap();
    assert_eq!(gem.rate, 120.0);
    assert!(gem.text.is_none());
    assert_eq!(outcome.refreshed.len(), 2);
}

#[tokio::test]
async fn test_refetched_page_replaces_tables() {
    let svc = gems_service().await;

    let before = svc.catalog.get_page(GEMS).await.unwrap();
    assert_eq!(before.tables.len(), 2);
    assert_eq!(svc.catalog.cache().page(GEMS).unwrap().value.tables.len(), 2);

    let replacement = Table::new(
        vec!["Item".into(), "Price".into()],
        vec![vec!["Gem".into(), "120 Coins".into()]],
    );
    svc.backend
        .add_page(GEMS, Some("Gem Exchange"), vec![replacement.clone()])
        .await;

    svc.catalog.request_extraction(GEMS, false).await.unwrap();
    assert!(svc.catalog.cache().page(GEMS).is_none());

    let after = svc.catalog.get_page(GEMS).await.unwrap();
    assert_eq!(after.tables, vec![replacement.clone()]);
    let cached = svc.catalog.cache().page(GEMS).unwrap();
    assert_eq!(cached.value.tables, vec![replacement]);
    assert_eq!(cached.value.page.table_count, 1);
}

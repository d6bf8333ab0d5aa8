use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use upstream::{UpstreamClient, UpstreamConfig};

use super::*;

enum PageScript {
    Ok(serde_json::Value),
    /// Respond with the body only after the given delay, so a later page
    /// can settle before this one.
    Slow(serde_json::Value, Duration),
    Fail(u16),
}

#[derive(Default)]
struct UpstreamStats {
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[derive(Clone)]
struct FakeUpstream {
    stats: Arc<UpstreamStats>,
    pages: Arc<Vec<PageScript>>,
}

async fn listing(
    State(state): State<FakeUpstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.stats.hits.fetch_add(1, Ordering::SeqCst);
    let now = state.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.stats.peak_in_flight.fetch_max(now, Ordering::SeqCst);

    let page: usize = params
        .get("page")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);
    let response = match &state.pages[page - 1] {
        PageScript::Ok(body) => (StatusCode::OK, Json(body.clone())).into_response(),
        PageScript::Slow(body, delay) => {
            tokio::time::sleep(*delay).await;
            (StatusCode::OK, Json(body.clone())).into_response()
        }
        PageScript::Fail(status) => StatusCode::from_u16(*status)
            .expect("status")
            .into_response(),
    };

    state.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

async fn spawn_upstream(pages: Vec<PageScript>) -> (String, Arc<UpstreamStats>) {
    let stats = Arc::new(UpstreamStats::default());
    let state = FakeUpstream {
        stats: stats.clone(),
        pages: Arc::new(pages),
    };
    let app = Router::new()
        .route("/vacancies", get(listing))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/vacancies"), stats)
}

fn page_body(ids: &[i64], last_page: u32) -> serde_json::Value {
    json!({
        "data": ids.iter().map(|id| json!({ "id_posisi": id })).collect::<Vec<_>>(),
        "meta": { "pagination": { "last_page": last_page } },
    })
}

fn context(base_url: String, token: Option<&str>) -> AggregatorContext {
    let config = UpstreamConfig {
        base_url,
        access_token: token.map(Into::into),
        page_limit: 2,
        request_timeout: Duration::from_secs(5),
    };
    AggregatorContext {
        upstream: UpstreamClient::new(config).expect("client"),
        fan_out_limit: 4,
    }
}

fn record_ids(listing: &AggregatedListing) -> Vec<i64> {
    listing
        .data
        .iter()
        .map(|record| record["id_posisi"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
async fn single_page_listing_issues_one_request() {
    let (url, stats) = spawn_upstream(vec![PageScript::Ok(page_body(&[1, 2], 1))]).await;
    let ctx = context(url, Some("token"));

    let listing = aggregate(&ctx).await.expect("listing");
    assert_eq!(record_ids(&listing), vec![1, 2]);
    assert_eq!(listing.total, 2);
    assert_eq!(listing.dropped_pages, 0);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multi_page_listing_concatenates_in_page_order() {
    let (url, stats) = spawn_upstream(vec![
        PageScript::Ok(page_body(&[1, 2], 3)),
        PageScript::Ok(page_body(&[3, 4], 3)),
        PageScript::Ok(page_body(&[5, 6], 3)),
    ])
    .await;
    let ctx = context(url, Some("token"));

    let listing = aggregate(&ctx).await.expect("listing");
    assert_eq!(record_ids(&listing), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(listing.total, 6);
    assert_eq!(listing.dropped_pages, 0);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failing_middle_page_is_dropped_not_fatal() {
    let (url, stats) = spawn_upstream(vec![
        PageScript::Ok(page_body(&[1, 2], 3)),
        PageScript::Fail(500),
        PageScript::Ok(page_body(&[5, 6], 3)),
    ])
    .await;
    let ctx = context(url, Some("token"));

    let listing = aggregate(&ctx).await.expect("listing");
    assert!(listing.success);
    assert_eq!(record_ids(&listing), vec![1, 2, 5, 6]);
    assert_eq!(listing.total, 4);
    assert_eq!(listing.dropped_pages, 1);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn first_page_failure_aborts_with_forwarded_status() {
    let (url, stats) = spawn_upstream(vec![
        PageScript::Fail(503),
        PageScript::Ok(page_body(&[3, 4], 2)),
    ])
    .await;
    let ctx = context(url, Some("token"));

    let err = aggregate(&ctx).await.expect_err("should fail");
    assert_eq!(err.http_status(), 503);
    assert!(matches!(err.error_code(), ErrorCode::Upstream));
    assert_eq!(stats.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let (url, stats) = spawn_upstream(vec![PageScript::Ok(page_body(&[1], 1))]).await;
    let ctx = context(url, None);

    let err = aggregate(&ctx).await.expect_err("should fail");
    assert!(matches!(err, AggregateError::MissingToken));
    assert_eq!(err.http_status(), 500);
    assert!(matches!(err.error_code(), ErrorCode::Configuration));
    assert_eq!(stats.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_pagination_metadata_means_single_page() {
    let (url, stats) = spawn_upstream(vec![PageScript::Ok(
        json!({ "data": [{ "id_posisi": 9 }] }),
    )])
    .await;
    let ctx = context(url, Some("token"));

    let listing = aggregate(&ctx).await.expect("listing");
    assert_eq!(record_ids(&listing), vec![9]);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_upstream_surfaces_a_transport_error() {
    // Bind-then-drop leaves a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let ctx = context(format!("http://{addr}/vacancies"), Some("token"));
    let err = aggregate(&ctx).await.expect_err("should fail");
    assert_eq!(err.http_status(), 500);
    assert!(matches!(err.error_code(), ErrorCode::Internal));
}

#[tokio::test]
async fn record_order_is_page_order_even_when_a_later_page_settles_first() {
    // Page 2 answers last; pages 3 and 4 settle while it sleeps.
    let (url, _) = spawn_upstream(vec![
        PageScript::Ok(page_body(&[1, 2], 4)),
        PageScript::Slow(page_body(&[3, 4], 4), Duration::from_millis(200)),
        PageScript::Ok(page_body(&[5, 6], 4)),
        PageScript::Ok(page_body(&[7, 8], 4)),
    ])
    .await;
    let ctx = context(url, Some("token"));

    let listing = aggregate(&ctx).await.expect("listing");
    assert_eq!(record_ids(&listing), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(listing.dropped_pages, 0);
}

#[tokio::test]
async fn fan_out_never_exceeds_the_configured_limit() {
    // Six subsequent pages, each slow enough that an uncapped fan-out
    // would have all of them in flight together.
    let mut pages = vec![PageScript::Ok(page_body(&[1], 7))];
    for page in 2..=7 {
        pages.push(PageScript::Slow(
            page_body(&[page as i64], 7),
            Duration::from_millis(50),
        ));
    }
    let (url, stats) = spawn_upstream(pages).await;

    let config = UpstreamConfig {
        base_url: url,
        access_token: Some("token".into()),
        page_limit: 1,
        request_timeout: Duration::from_secs(5),
    };
    let ctx = AggregatorContext {
        upstream: UpstreamClient::new(config).expect("client"),
        fan_out_limit: 2,
    };

    let listing = aggregate(&ctx).await.expect("listing");
    assert_eq!(listing.total, 7);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 7);
    assert!(
        stats.peak_in_flight.load(Ordering::SeqCst) <= 2,
        "peak in-flight {} exceeded the fan-out limit",
        stats.peak_in_flight.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn repeated_aggregation_is_idempotent() {
    let (url, _) = spawn_upstream(vec![
        PageScript::Ok(page_body(&[1, 2], 2)),
        PageScript::Ok(page_body(&[3, 4], 2)),
    ])
    .await;
    let ctx = context(url, Some("token"));

    let first = aggregate(&ctx).await.expect("first");
    let second = aggregate(&ctx).await.expect("second");
    assert_eq!(record_ids(&first), record_ids(&second));
}

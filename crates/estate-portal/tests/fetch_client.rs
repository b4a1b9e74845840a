use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use estate_portal::listings::{FetchError, FetchOutcome, LatestRequest, ListingsClient, MarketingType};
use serde_json::{json, Value};

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

fn listing(id: i64, title: &str, marketing_type: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "location": "Torstraße 1 10119 Berlin",
        "neighborhood": "Mitte",
        "image": "",
        "images": [],
        "price": 1450.0,
        "currency": "EUR",
        "beds": 2,
        "baths": 1,
        "sqm": 64.0,
        "type": marketing_type,
        "isNew": true
    })
}

#[tokio::test]
async fn fetch_passes_query_and_decodes_listings() {
    let router = Router::new().route(
        "/api/properties",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let title = format!(
                "{}-{}",
                params.get("locale").cloned().unwrap_or_default(),
                params.get("marketing_type").cloned().unwrap_or_default()
            );
            Json(json!({ "data": [listing(3, &title, "RENT")], "total": 1 }))
        }),
    );
    let base_url = spawn_stub(router).await;
    let client = ListingsClient::new(base_url).expect("client builds");

    let listings = client
        .fetch("de", Some(MarketingType::Rent), None)
        .await
        .expect("listings decode");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].title, "de-RENT");
    assert_eq!(listings[0].marketing_type, MarketingType::Rent);
    assert!(listings[0].is_new);
}

#[tokio::test]
async fn non_success_status_carries_status_and_body() {
    let router = Router::new().route(
        "/api/properties",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream maintenance") }),
    );
    let base_url = spawn_stub(router).await;
    let client = ListingsClient::new(base_url).expect("client builds");

    let error = client.fetch("en", None, None).await.expect_err("503 surfaces");
    match error {
        FetchError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_proxy_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);

    let client = ListingsClient::new(format!("http://{addr}")).expect("client builds");
    let error = client.fetch("en", None, None).await.expect_err("nothing listening");
    assert!(matches!(error, FetchError::Network(_)), "got {error:?}");
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let router = Router::new().route(
        "/api/properties",
        get(|| async { Json(json!({ "data": "not a list" })) }),
    );
    let base_url = spawn_stub(router).await;
    let client = ListingsClient::new(base_url).expect("client builds");

    let error = client.fetch("en", None, None).await.expect_err("bad payload");
    assert!(matches!(error, FetchError::Decode(_)), "got {error:?}");
}

#[tokio::test]
async fn slower_superseded_response_is_discarded() {
    let router = Router::new().route(
        "/api/properties",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let locale = params.get("locale").cloned().unwrap_or_default();
            if locale == "de" {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Json(json!({ "data": [listing(1, &locale, "BUY")], "total": 1 }))
        }),
    );
    let base_url = spawn_stub(router).await;
    let client = ListingsClient::new(base_url).expect("client builds");
    let guard = LatestRequest::new();

    let (older, newer) = tokio::join!(
        guard.run(client.fetch("de", None, None)),
        guard.run(client.fetch("en", None, None)),
    );

    assert!(matches!(older, FetchOutcome::Superseded));
    let listings = newer
        .current()
        .expect("latest request applies")
        .expect("latest request succeeds");
    assert_eq!(listings[0].title, "en");
}

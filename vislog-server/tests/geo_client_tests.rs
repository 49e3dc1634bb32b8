//! IpApiClient against a local stand-in for the geolocation service

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use vislog_common::models::GeoLocation;
use vislog_server::enrich::{Enricher, GeoError, GeoLookup, IpApiClient};

async fn fake_lookup(Path(ip): Path<String>) -> impl IntoResponse {
    match ip.as_str() {
        "203.0.113.5" => Json(json!({
            "status": "success",
            "country": "France",
            "regionName": "Ile-de-France",
            "city": "Paris",
            "query": "203.0.113.5",
        }))
        .into_response(),
        "203.0.113.6" => Json(json!({
            "status": "success",
            "country": "Iceland",
            "regionName": "",
            "city": "",
        }))
        .into_response(),
        "10.0.0.1" => Json(json!({
            "status": "fail",
            "message": "private range",
            "query": "10.0.0.1",
        }))
        .into_response(),
        "198.51.100.1" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (StatusCode::OK, "not json").into_response(),
    }
}

/// Start the stand-in service on an ephemeral port
async fn spawn_geo_service() -> String {
    let app = Router::new().route("/json/:ip", get(fake_lookup));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_lookup_success() {
    let base = spawn_geo_service().await;
    let client = IpApiClient::new(format!("{}/", base)).unwrap();
    assert_eq!(client.base_url(), base);

    let location = client.lookup("203.0.113.5").await.unwrap();
    assert_eq!(location, GeoLocation::new("Paris", "Ile-de-France", "France"));
}

#[tokio::test]
async fn test_lookup_empty_fields_become_unknown() {
    let client = IpApiClient::new(spawn_geo_service().await).unwrap();

    let location = client.lookup("203.0.113.6").await.unwrap();
    assert_eq!(location.city, "Unknown");
    assert_eq!(location.region, "Unknown");
    assert_eq!(location.country, "Iceland");
}

#[tokio::test]
async fn test_lookup_fail_status() {
    let client = IpApiClient::new(spawn_geo_service().await).unwrap();

    match client.lookup("10.0.0.1").await {
        Err(GeoError::Lookup(message)) => assert_eq!(message, "private range"),
        other => panic!("expected lookup failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_http_error() {
    let client = IpApiClient::new(spawn_geo_service().await).unwrap();

    match client.lookup("198.51.100.1").await {
        Err(GeoError::Api(500)) => {}
        other => panic!("expected HTTP 500, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_malformed_body() {
    let client = IpApiClient::new(spawn_geo_service().await).unwrap();

    assert!(matches!(
        client.lookup("192.0.2.1").await,
        Err(GeoError::Parse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_service_degrades_to_unknown() {
    // Grab a free port, then release it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = IpApiClient::new(format!("http://127.0.0.1:{}", port)).unwrap();
    assert!(matches!(
        client.lookup("203.0.113.5").await,
        Err(GeoError::Network(_))
    ));

    let enricher = Enricher::new(Arc::new(client));
    assert_eq!(enricher.locate("203.0.113.5").await, GeoLocation::unknown());
}

#[tokio::test]
async fn test_mapped_ipv4_queried_as_ipv4() {
    let client = IpApiClient::new(spawn_geo_service().await).unwrap();
    let enricher = Enricher::new(Arc::new(client));

    let record = enricher.enrich("::ffff:203.0.113.5", None).await;
    assert_eq!(record.ip, "::ffff:203.0.113.5");
    assert_eq!(record.city, "Paris");
}

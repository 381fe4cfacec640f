use std::sync::Arc;

use marquee::catalog::{Catalog, Movie};
use marquee::hovercard::cache::{ActorKey, ContentFetcher};
use marquee::hovercard::profile::ProfileContentFetcher;
use marquee::media::{HttpTrailerSource, TrailerSource};
use marquee::server::router;
use marquee::test_support::SAMPLE_CATALOG_YAML;
use reqwest::StatusCode;
use tokio::net::TcpListener;

async fn start_server() -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let catalog = Catalog::from_yaml(SAMPLE_CATALOG_YAML).expect("sample catalog should parse");

    tokio::spawn(async move {
        let _ = axum::serve(listener, router(Arc::new(catalog))).await;
    });
    Some(format!("http://{addr}"))
}

#[tokio::test]
async fn health_and_movie_listing_respond() {
    let Some(base) = start_server().await else {
        eprintln!("skipping: local TCP bind is not permitted in this environment");
        return;
    };
    let client = reqwest::Client::new();

    let health: serde_json::Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health body should be JSON");
    assert_eq!(health["status"], "ok");

    let movies: Vec<Movie> = client
        .get(format!("{base}/api/movies"))
        .send()
        .await
        .expect("movies request should complete")
        .json()
        .await
        .expect("movies body should decode");
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].id, "analytical-engine");
}

#[tokio::test]
async fn unknown_ids_return_not_found_json() {
    let Some(base) = start_server().await else {
        eprintln!("skipping: local TCP bind is not permitted in this environment");
        return;
    };
    let client = reqwest::Client::new();

    for path in ["/api/movies/missing", "/api/actors/Nobody", "/api/trailers/compiler"] {
        let response = client
            .get(format!("{base}{path}"))
            .send()
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
        let body: serde_json::Value = response.json().await.expect("error body should be JSON");
        assert!(
            body["error"].as_str().is_some_and(|error| !error.is_empty()),
            "expected error message for {path}, got: {body}"
        );
    }
}

#[tokio::test]
async fn profile_fetcher_builds_card_from_server() {
    let Some(base) = start_server().await else {
        eprintln!("skipping: local TCP bind is not permitted in this environment");
        return;
    };
    let fetcher = ProfileContentFetcher::new(base);
    let key = ActorKey::new("Ada Lovelace", "/actors/ada-lovelace", "/img/ada.jpg");

    let fragment = fetcher.fetch(&key).await.expect("profile should load");
    let message = &fragment.children[0];
    assert!(message.element.has_class("hover-card-message"));
    assert_eq!(message.children.len(), 4);

    let missing = ActorKey::new("Nobody", "/actors/nobody", "/img/nobody.jpg");
    assert!(fetcher.fetch(&missing).await.is_none());
}

#[tokio::test]
async fn trailer_source_resolves_relative_urls_against_server() {
    let Some(base) = start_server().await else {
        eprintln!("skipping: local TCP bind is not permitted in this environment");
        return;
    };
    let source = HttpTrailerSource::new(base);

    let info = source
        .trailer("/api/trailers/analytical-engine")
        .await
        .expect("trailer should load");
    assert_eq!(info.mime_type, "video/mp4");
    assert_eq!(info.url, "/media/analytical-engine.mp4");

    assert!(source.trailer("/api/trailers/compiler").await.is_none());
}

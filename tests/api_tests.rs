//! Read-surface smoke tests over a seeded in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use anisync::api::{self, AppState};
use anisync::clients::fribb::FribbMapping;
use anisync::db::Store;
use anisync::sync::transform;

async fn seeded_app() -> (Store, axum::Router) {
    let store = Store::new("sqlite::memory:").await.expect("store");

    let media = serde_json::from_value(serde_json::json!({
        "id": 1,
        "idMal": 1,
        "title": {
            "romaji": "Cowboy Bebop",
            "english": "Cowboy Bebop",
            "native": "カウボーイビバップ",
            "userPreferred": "Cowboy Bebop"
        },
        "status": "FINISHED",
        "format": "TV",
        "season": "SPRING",
        "seasonYear": 1998,
        "genres": ["Action", "Sci-Fi"],
        "studios": { "edges": [{ "node": { "name": "Sunrise", "isAnimationStudio": true } }] },
        "characters": { "edges": [{
            "role": "MAIN",
            "node": { "name": { "userPreferred": "Spike Spiegel" } },
            "voiceActors": [{
                "name": { "userPreferred": "Yamadera Kouichi" },
                "languageV2": "Japanese"
            }]
        }]},
        "externalLinks": [{ "url": "https://example.com/watch", "site": "Example" }]
    }))
    .unwrap();

    let mapping = FribbMapping {
        anilist: 1,
        ..FribbMapping::default()
    };
    let graph = transform::build_graph(media, &mapping);
    store.upsert_graph(&graph).await.expect("seed upsert");

    let state = Arc::new(AppState {
        store: store.clone(),
    });
    (store, api::router(state))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn lookup_by_anilist_id_returns_full_graph() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/anime/anilist/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["anilist_id"], 1);
    assert_eq!(data["title_romaji"], "Cowboy Bebop");
    assert_eq!(data["characters"][0]["role"], "MAIN");
    assert_eq!(
        data["characters"][0]["voice_actors"][0]["language"],
        "Japanese"
    );
    assert_eq!(data["genres"].as_array().unwrap().len(), 2);
    assert_eq!(data["studios"][0]["name"], "Sunrise");
    assert_eq!(data["external_links"][0]["url"], "https://example.com/watch");
}

#[tokio::test]
async fn lookup_of_missing_title_is_404() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/anime/anilist/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn search_matches_substring_case_insensitively() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/anime/search?q=cowboy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["results"][0]["anilist_id"], 1);
    assert_eq!(body["data"]["page"], 1);
}

#[tokio::test]
async fn search_misses_return_empty_page() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/anime/search?q=trigun&page=1&per_page=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn blank_search_query_is_rejected() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/anime/search?q=%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let (_store, app) = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

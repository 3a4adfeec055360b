use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use super::*;
use crate::routes::api_routes;

fn sample_state() -> AppState {
    AppState::new(PublicConfig {
        supabase_url: "https://abc.supabase.co".to_owned(),
        supabase_anon_key: "anon-key".to_owned(),
        oauth_provider: "google".to_owned(),
        bookmarks_table: "bookmarks".to_owned(),
    })
}

#[tokio::test]
async fn config_endpoint_returns_public_settings() {
    let response = api_routes(sample_state())
        .oneshot(Request::builder().uri("/api/config").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let config: PublicConfig = serde_json::from_slice(&body).unwrap();
    assert_eq!(config, sample_state().public.as_ref().clone());
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = api_routes(sample_state())
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_api_path_is_not_found() {
    let response = api_routes(sample_state())
        .oneshot(Request::builder().uri("/api/bookmarks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

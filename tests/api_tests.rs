//! HTTP surface tests: router + middleware + handlers over the in-memory
//! store, driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use agora_stories::config::Config;
use agora_stories::routes;
use agora_stories::services::{CommentService, StoryService, ThreadStore};
use agora_stories::state::AppState;
use agora_stories::utils::middleware::identity_middleware;

async fn test_app() -> Router {
    let config = Config::default();
    let store = Arc::new(ThreadStore::new());
    let story_service = StoryService::new(store.clone(), config.clone())
        .await
        .unwrap();
    let comment_service = CommentService::new(store.clone(), config.clone())
        .await
        .unwrap();
    let state = Arc::new(AppState {
        config,
        store,
        story_service,
        comment_service,
    });

    Router::new()
        .nest("/api/stories", routes::stories::router())
        .nest("/api/comments", routes::comments::router())
        .layer(axum::middleware::from_fn(identity_middleware))
        .with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_story(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/stories",
        Some("host"),
        Some(json!({
            "neighborhood": "Maple Heights",
            "category": "daily_life",
            "content": "Sunflower seedlings to give away"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_comment(app: &Router, story_id: &str, parent_id: Option<&str>, user: &str, content: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/comments",
        Some(user),
        Some(json!({
            "story_id": story_id,
            "parent_id": parent_id,
            "content": content
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn story_comments_paginate_over_http() {
    let app = test_app().await;
    let story_id = create_story(&app).await;
    for i in 0..12 {
        create_comment(&app, &story_id, None, "neighbor", &format!("comment {}", i)).await;
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stories/{}/comments?page_size=10", story_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(page["total_child_count"], 12);
    let cursor = page["next_cursor"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stories/{}/comments?page_size=10&cursor={}", story_id, cursor),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert!(page["next_cursor"].is_null());
}

#[tokio::test]
async fn reply_chain_stops_with_depth_exceeded() {
    let app = test_app().await;
    let story_id = create_story(&app).await;

    let root = create_comment(&app, &story_id, None, "neighbor", "root").await;
    let reply = create_comment(&app, &story_id, root["id"].as_str(), "neighbor", "reply").await;
    let deepest = create_comment(&app, &story_id, reply["id"].as_str(), "neighbor", "deepest").await;
    assert_eq!(deepest["depth"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/comments",
        Some("neighbor"),
        Some(json!({
            "story_id": story_id,
            "parent_id": deepest["id"],
            "content": "one level too far"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DEPTH_EXCEEDED");
}

#[tokio::test]
async fn reactions_round_trip_over_http() {
    let app = test_app().await;
    let story_id = create_story(&app).await;
    let comment = create_comment(&app, &story_id, None, "neighbor", "nice!").await;
    let comment_id = comment["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/comments/{}/reactions", comment_id),
        Some("reader"),
        Some(json!({ "kind": "love" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["like_count"], 1);
    assert_eq!(body["data"]["liked_by_viewer"], true);

    // Toggling the same kind again removes the reaction.
    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/comments/{}/reactions", comment_id),
        Some("reader"),
        Some(json!({ "kind": "love" })),
    )
    .await;
    assert_eq!(body["data"]["like_count"], 0);
    assert_eq!(body["data"]["liked_by_viewer"], false);
}

#[tokio::test]
async fn delete_is_soft_and_author_only() {
    let app = test_app().await;
    let story_id = create_story(&app).await;
    let parent = create_comment(&app, &story_id, None, "author-1", "parent").await;
    let parent_id = parent["id"].as_str().unwrap().to_string();
    create_comment(&app, &story_id, Some(&parent_id), "author-2", "child").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/comments/{}", parent_id),
        Some("author-2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/comments/{}", parent_id),
        Some("author-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["updated_at"].is_string());

    // The tombstone still anchors its reply.
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/stories/{}/comments", story_id),
        None,
        None,
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content"], "");
    assert_eq!(items[0]["child_count"], 1);
}

#[tokio::test]
async fn mutations_require_an_identity() {
    let app = test_app().await;
    let story_id = create_story(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/comments",
        None,
        Some(json!({
            "story_id": story_id,
            "parent_id": null,
            "content": "anonymous shout"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");
}

#[tokio::test]
async fn oversized_page_sizes_are_rejected() {
    let app = test_app().await;
    let story_id = create_story(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stories/{}/comments?page_size=500", story_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

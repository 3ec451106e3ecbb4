//! API client behavior against a mock HTTP server

use httpmock::prelude::*;
use serde_json::json;

use himafi_core::api::{ApiClient, ApiError};
use himafi_core::model::{CommentAuthor, FavoriteKind, NewComment};

#[tokio::test]
async fn lists_opportunities_from_envelope() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/opportunities");
            then.status(200).json_body(json!({
                "success": true,
                "data": [{
                    "id": "op-1",
                    "title": "Summer Research Internship",
                    "type": "internship",
                    "organization": "BRIN",
                    "deadline": "2026-03-01",
                    "description": "Twelve weeks of lab work.",
                    "requirements": ["CV"],
                    "createdAt": "2026-01-05T08:00:00Z",
                    "updatedAt": "2026-01-06T08:00:00Z"
                }]
            }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let opportunities = client.opportunities().await.unwrap();
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].title, "Summer Research Internship");
}

#[tokio::test]
async fn error_envelope_surfaces_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/articles/missing");
            then.status(404)
                .json_body(json!({ "success": false, "error": "Article not found" }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let err = client.article("missing").await.unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Article not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/api/opportunities/op-9")
                .header("authorization", "Bearer secret-token");
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    let client = ApiClient::new(server.url("/api")).with_token("secret-token");
    client.delete_opportunity("op-9").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn create_comment_posts_camel_case_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/comments")
                .json_body_includes(r#"{ "content": "Great talk!", "articleId": "a-1" }"#);
            then.status(200).json_body(json!({
                "success": true,
                "data": {
                    "id": "c-1",
                    "content": "Great talk!",
                    "author": { "name": "Siti", "email": "siti@example.org" },
                    "createdAt": "2026-02-10T00:00:00Z",
                    "articleId": "a-1"
                }
            }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let comment = client
        .create_comment(&NewComment {
            content: "Great talk!".to_string(),
            author: CommentAuthor {
                name: "Siti".to_string(),
                email: "siti@example.org".to_string(),
            },
            article_id: Some("a-1".to_string()),
            opportunity_id: None,
        })
        .await
        .unwrap();

    assert_eq!(comment.id, "c-1");
    mock.assert_async().await;
}

#[tokio::test]
async fn comments_query_prefers_article_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/comments")
                .query_param("articleId", "a-1");
            then.status(200).json_body(json!({ "success": true, "data": [] }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let comments = client.comments(Some("a-1"), Some("op-1")).await.unwrap();
    assert!(comments.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn add_favorite_sends_item_and_kind() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/favorites")
                .json_body(json!({ "itemId": "a-3", "type": "article" }));
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    client
        .add_to_favorites("a-3", FavoriteKind::Article)
        .await
        .unwrap();
    mock.assert_async().await;
}

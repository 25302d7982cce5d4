use postboard::{
    AppConfig, AppState, MemoryRepository, create_router,
    auth::LOCAL_HANDLE_HEADER,
    models::{Comment, Post, PostWithComments},
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Serves the full router on an ephemeral port, backed by the in-memory store with
/// two registered handles.
async fn spawn_app() -> TestApp {
    let repo = MemoryRepository::new()
        .with_user("alice", Some("https://cdn.example.com/alice.png"))
        .with_user("bob", None);
    let state = AppState::new(Arc::new(repo) as RepositoryState, AppConfig::default());
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;

    // Create
    let response = app
        .client
        .post(app.url("/posts"))
        .header(LOCAL_HANDLE_HEADER, "alice")
        .json(&serde_json::json!({ "title": "Hello", "body": "First post", "tags": ["intro"] }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 200);
    let post: Post = response.json().await.unwrap();
    assert_eq!(post.handle_name, "alice");
    assert_eq!(post.tags, vec!["intro"]);

    // Comment
    let response = app
        .client
        .post(app.url(&format!("/posts/{}/comments", post.post_id)))
        .header(LOCAL_HANDLE_HEADER, "bob")
        .json(&serde_json::json!({ "body": "Welcome!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let comment: Comment = response.json().await.unwrap();
    assert_eq!(comment.post_id, post.post_id);

    // Like
    let response = app
        .client
        .post(app.url(&format!("/posts/{}/like", post.post_id)))
        .header(LOCAL_HANDLE_HEADER, "bob")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Read back
    let fetched: PostWithComments = app
        .client
        .get(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.post.like_count, 1);
    assert_eq!(fetched.post.comment_count, 1);
    assert_eq!(fetched.comments, vec![comment]);

    // Delete
    let response = app
        .client
        .delete(app.url(&format!("/posts/{}", post.post_id)))
        .header(LOCAL_HANDLE_HEADER, "alice")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_public_listing_sees_every_author() {
    let app = spawn_app().await;

    for handle in ["alice", "bob"] {
        let response = app
            .client
            .post(app.url("/posts"))
            .header(LOCAL_HANDLE_HEADER, handle)
            .json(&serde_json::json!({ "title": format!("by {handle}"), "body": "..." }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let list: Vec<Post> = app
        .client
        .get(app.url("/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    // Second post was created last.
    assert_eq!(list[0].handle_name, "bob");
}

#[tokio::test]
async fn test_bearer_token_garbage_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/posts"))
        .bearer_auth("not.a.jwt")
        .json(&serde_json::json!({ "title": "x", "body": "y" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");
}

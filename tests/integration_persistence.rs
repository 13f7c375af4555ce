use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

fn file_backed_config(dir: &tempfile::TempDir) -> todo_server::config::Config {
    let mut config = common::get_test_config();
    config.database.url = format!("sqlite://{}?mode=rwc", dir.path().join("todo.db").display());
    config.database.max_connections = 4;
    config
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let username = common::generate_username("durable");

    let (refresh_token, access_token) = {
        let app = common::TestApp::spawn_with_config(file_backed_config(&dir)).await;
        assert_eq!(app.register(&username, "password123").await.status(), StatusCode::CREATED);

        let session: Value = app.login(&username, "password123").await.json().await.unwrap();
        let token = session["token"].as_str().unwrap().to_string();
        app.todos(&token).create(&json!({ "text": "remember me" })).await;

        app.pool.close().await;
        (session["refreshToken"].as_str().unwrap().to_string(), token)
    };

    let app = common::TestApp::spawn_with_config(file_backed_config(&dir)).await;

    // Existing credentials and todos are still there
    assert_eq!(app.login(&username, "password123").await.status(), StatusCode::OK);
    let list: Vec<Value> = app.todos(&access_token).list().await.json().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["text"], "remember me");

    // The refresh token issued before the restart still rotates, once
    assert_eq!(app.refresh(&refresh_token).await.status(), StatusCode::OK);
    assert_eq!(app.refresh(&refresh_token).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_token_hashes_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::TestApp::spawn_with_config(file_backed_config(&dir)).await;
    let (_, session) = app.register_and_login().await;
    let secret = session["refreshToken"].as_str().unwrap();

    let hashes: Vec<String> =
        sqlx::query_scalar("SELECT token_hash FROM refresh_tokens").fetch_all(&app.pool).await.unwrap();

    assert_eq!(hashes.len(), 1);
    assert_ne!(hashes[0], secret);
    assert_eq!(hashes[0].len(), 64);
}

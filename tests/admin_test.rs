mod common;

use axum::http::StatusCode;
use common::{add_json, location, login, login_admin, register, register_and_login, spawn_app};
use serde_json::{Value, json};

async fn user_id(app: &common::TestApp, username: &str) -> i32 {
    app.state.store.find_profile_by_username(username).await.unwrap().unwrap().id
}

#[tokio::test]
async fn test_default_admin_is_seeded_once() {
    let app = spawn_app().await;

    let profiles = app.state.store.list_profiles().await.unwrap();
    let admins: Vec<_> = profiles.iter().filter(|p| p.is_admin).collect();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].username, "admin");

    reelwatch::db::seed_admin(&app.state.store, "other", 4).await.unwrap();
    assert_eq!(app.state.store.list_profiles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_admin_is_sent_home() {
    let app = spawn_app().await;
    register_and_login(&app.server, "alice", "pw").await;

    for path in ["/admin", "/api/users"] {
        let resp = app.server.get(path).await;
        assert_eq!(location(&resp), "/", "{path}");
    }

    let resp = app.server.delete("/api/users/1").await;
    assert_eq!(location(&resp), "/");
    assert!(app.state.store.find_profile_by_username("admin").await.unwrap().is_some());
}

#[tokio::test]
async fn test_dashboard_and_listing_hide_password_hashes() {
    let app = spawn_app().await;
    register(&app.server, "alice", "pw").await;
    login_admin(&app.server).await;

    let page = app.server.get("/admin").await;
    let html = page.text();
    assert!(html.contains("User Management"));
    assert!(html.contains("alice"));
    assert!(!html.contains("$2"));

    let users: Vec<Value> = app.server.get("/api/users").await.json();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], json!({ "id": users[0]["id"], "username": "admin", "is_admin": true }));
    assert_eq!(users[1]["username"], "alice");
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn test_reset_password() {
    let app = spawn_app().await;
    register(&app.server, "alice", "old").await;
    login_admin(&app.server).await;
    let id = user_id(&app, "alice").await;

    let resp = app
        .server
        .post(&format!("/api/users/{id}/reset-password"))
        .json(&json!({ "newPassword": "" }))
        .expect_failure()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({ "error": "New password is required" }));

    let resp = app
        .server
        .post("/api/users/9999/reset-password")
        .json(&json!({ "newPassword": "x" }))
        .expect_failure()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = app
        .server
        .post(&format!("/api/users/{id}/reset-password"))
        .json(&json!({ "newPassword": "new" }))
        .await;
    resp.assert_json(&json!({ "message": "Password updated successfully" }));

    let alice = app.new_client();
    let resp = login(&alice, "alice", "old").await;
    assert!(resp.text().contains("Invalid credentials"));
    let resp = login(&alice, "alice", "new").await;
    assert_eq!(location(&resp), "/search");
}

#[tokio::test]
async fn test_rename_rekeys_watchlist() {
    let app = spawn_app().await;

    let alice = app.new_client();
    register_and_login(&alice, "alice", "pw").await;
    add_json(&alice, "s1").await;
    add_json(&alice, "s3").await;
    register(&app.server, "bob", "pw").await;

    login_admin(&app.server).await;
    let id = user_id(&app, "alice").await;
    let url = format!("/api/users/{id}/username");

    let resp = app.server.put(&url).json(&json!({})).expect_failure().await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({ "error": "New username is required" }));

    let resp = app.server.put(&url).json(&json!({ "newUsername": "bob" })).expect_failure().await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({ "error": "Username already exists" }));

    let resp = app
        .server
        .put("/api/users/9999/username")
        .json(&json!({ "newUsername": "zed" }))
        .expect_failure()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = app.server.put(&url).json(&json!({ "newUsername": "alicia" })).await;
    resp.assert_json(&json!({ "message": "Username updated successfully" }));

    assert!(app.state.store.watchlist("alice").await.unwrap().is_empty());
    assert_eq!(app.state.store.watchlist("alicia").await.unwrap().len(), 2);

    let fresh = app.new_client();
    let resp = login(&fresh, "alicia", "pw").await;
    assert_eq!(location(&resp), "/search");
}

#[tokio::test]
async fn test_admin_renaming_self_keeps_working_session() {
    let app = spawn_app().await;
    login_admin(&app.server).await;
    let id = user_id(&app, "admin").await;

    let resp = app
        .server
        .put(&format!("/api/users/{id}/username"))
        .json(&json!({ "newUsername": "root" }))
        .await;
    resp.assert_status_ok();

    add_json(&app.server, "s1").await;
    assert_eq!(app.state.store.watchlist("root").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_rules() {
    let app = spawn_app().await;

    let alice = app.new_client();
    register_and_login(&alice, "alice", "pw").await;
    add_json(&alice, "s1").await;

    app.state.store.create_profile("second_admin", "unused", true).await.unwrap();

    login_admin(&app.server).await;
    let me = user_id(&app, "admin").await;
    let other_admin = user_id(&app, "second_admin").await;
    let alice_id = user_id(&app, "alice").await;

    let resp = app.server.delete("/api/users/9999").expect_failure().await;
    resp.assert_status(StatusCode::NOT_FOUND);
    resp.assert_json(&json!({ "error": "User not found" }));

    let resp = app.server.delete(&format!("/api/users/{me}")).expect_failure().await;
    resp.assert_status(StatusCode::FORBIDDEN);
    resp.assert_json(&json!({ "error": "Cannot delete your own account" }));

    let resp = app.server.delete(&format!("/api/users/{other_admin}")).expect_failure().await;
    resp.assert_status(StatusCode::FORBIDDEN);
    resp.assert_json(&json!({ "error": "Cannot delete admin user" }));

    let resp = app.server.delete(&format!("/api/users/{alice_id}")).await;
    resp.assert_json(&json!({ "message": "User deleted successfully" }));

    assert!(app.state.store.find_profile(alice_id).await.unwrap().is_none());
    assert!(app.state.store.watchlist("alice").await.unwrap().is_empty());
    assert!(app.state.store.find_profile(other_admin).await.unwrap().is_some());
}

#[tokio::test]
async fn test_deleted_user_loses_session() {
    let app = spawn_app().await;

    let alice = app.new_client();
    register_and_login(&alice, "alice", "pw").await;
    add_json(&alice, "s1").await;

    login_admin(&app.server).await;
    let id = user_id(&app, "alice").await;
    app.server.delete(&format!("/api/users/{id}")).await.assert_status_ok();

    let resp = alice.get("/search").await;
    assert_eq!(location(&resp), "/login");

    let resp = alice.post("/add_to_watchlist").json(&json!({ "showId": "s3" })).await;
    assert_eq!(location(&resp), "/login");
    assert!(app.state.store.watchlist("alice").await.unwrap().is_empty());

    // a newcomer with the same name starts from scratch
    let newcomer = app.new_client();
    register_and_login(&newcomer, "alice", "other").await;
    assert!(app.state.store.watchlist("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_renamed_user_writes_under_new_name() {
    let app = spawn_app().await;

    let alice = app.new_client();
    register_and_login(&alice, "alice", "pw").await;
    add_json(&alice, "s1").await;

    login_admin(&app.server).await;
    let id = user_id(&app, "alice").await;
    app.server
        .put(&format!("/api/users/{id}/username"))
        .json(&json!({ "newUsername": "carol" }))
        .await
        .assert_status_ok();

    add_json(&alice, "s3").await;

    let carol = app.state.store.watchlist_ids("carol").await.unwrap();
    assert_eq!(carol.len(), 2);
    assert!(carol.contains("s1") && carol.contains("s3"));
    assert!(app.state.store.watchlist("alice").await.unwrap().is_empty());

    let page = alice.get("/search").await;
    assert!(page.text().contains("Welcome, carol"));
}

#[tokio::test]
async fn test_malformed_api_requests_answer_in_json() {
    let app = spawn_app().await;
    register(&app.server, "alice", "pw").await;
    login_admin(&app.server).await;
    let id = user_id(&app, "alice").await;

    let resp = app.server.post(&format!("/api/users/{id}/reset-password")).expect_failure().await;
    resp.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = resp.json();
    assert!(body["error"].is_string());

    let resp = app
        .server
        .put(&format!("/api/users/{id}/username"))
        .text("{not json")
        .content_type("application/json")
        .expect_failure()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert!(body["error"].is_string());

    let resp = app.server.delete("/api/users/abc").expect_failure().await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert!(body["error"].is_string());

    assert!(app.state.store.find_profile(id).await.unwrap().is_some());
}

mod common;

use axum::http::{
    HeaderValue, StatusCode,
    header::{COOKIE, SET_COOKIE},
};
use common::{location, login, login_admin, register, register_and_login, spawn_app};

#[tokio::test]
async fn test_register_then_login_lands_on_search() {
    let app = spawn_app().await;

    let resp = register(&app.server, "alice", "s3cret").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login?success=Registration%20successful"));

    let page = app.server.get(&location(&resp)).await;
    assert!(page.text().contains("Registration successful. Please login now."));

    let resp = login(&app.server, "alice", "s3cret").await;
    assert_eq!(location(&resp), "/search");

    let page = app.server.get("/search").await;
    page.assert_status_ok();
    assert!(page.text().contains("Welcome, alice"));
}

#[tokio::test]
async fn test_usernames_are_trimmed() {
    let app = spawn_app().await;

    register(&app.server, "  bob  ", "pw").await;
    let resp = login(&app.server, "bob", "pw").await;
    assert_eq!(location(&resp), "/search");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = spawn_app().await;

    register(&app.server, "alice", "first").await;
    let resp = register(&app.server, "alice", "second").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("Username already exists"));

    let profiles = app.state.store.list_profiles().await.unwrap();
    assert_eq!(profiles.iter().filter(|p| p.username == "alice").count(), 1);

    // the original password still works
    let resp = login(&app.server, "alice", "first").await;
    assert_eq!(location(&resp), "/search");
}

#[tokio::test]
async fn test_missing_fields() {
    let app = spawn_app().await;

    let resp = register(&app.server, "", "pw").await;
    assert!(resp.text().contains("Username and password are required"));

    let resp = register(&app.server, "carol", "").await;
    assert!(resp.text().contains("Username and password are required"));

    let resp = login(&app.server, "carol", "").await;
    assert!(resp.text().contains("Missing username or password."));
}

#[tokio::test]
async fn test_bad_password_sets_no_session() {
    let app = spawn_app().await;
    register(&app.server, "alice", "right").await;

    let resp = login(&app.server, "alice", "wrong").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("Invalid credentials"));
    assert!(resp.headers().get(SET_COOKIE).is_none());

    let resp = login(&app.server, "nobody", "whatever").await;
    assert!(resp.text().contains("Invalid credentials"));

    let resp = app.server.get("/search").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_admin_login_goes_to_dashboard() {
    let app = spawn_app().await;
    login_admin(&app.server).await;

    let page = app.server.get("/admin").await;
    page.assert_status_ok();
    assert!(page.text().contains("User Management"));
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = spawn_app().await;
    register_and_login(&app.server, "alice", "pw").await;

    let resp = app.server.get("/logout").await;
    assert_eq!(location(&resp), "/login");

    let resp = app.server.get("/my_watchlist").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_anonymous_requests_redirect_to_login() {
    let app = spawn_app().await;

    for path in ["/search", "/results?title=heat", "/my_watchlist", "/recommendations", "/admin", "/api/users"] {
        let resp = app.server.get(path).await;
        assert_eq!(location(&resp), "/login", "{path}");
    }

    let resp = app.server.post("/add_to_watchlist").form(&[("showId", "s1")]).await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_landing_page_follows_session() {
    let app = spawn_app().await;

    let page = app.server.get("/").await;
    assert!(page.text().contains("href=\"/register\""));

    register_and_login(&app.server, "alice", "pw").await;
    let page = app.server.get("/").await;
    assert!(page.text().contains("href=\"/my_watchlist\""));
}

#[tokio::test]
async fn test_tampered_cookie_is_ignored() {
    let app = spawn_app().await;

    let resp = app
        .server
        .get("/search")
        .add_header(
            COOKIE,
            HeaderValue::from_static(
                "session=%7B%22user_id%22%3A1%2C%22username%22%3A%22admin%22%2C%22is_admin%22%3Atrue%7D",
            ),
        )
        .await;
    assert_eq!(location(&resp), "/login");
}

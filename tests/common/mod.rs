#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header::LOCATION},
    routing::{get, post},
};
use axum_test::{TestResponse, TestServer};
use reelwatch::{AppState, config::Config};
use serde_json::{Value, json};

pub const ADMIN_PASSWORD: &str = "adminpass";

/// Address nothing listens on, for upstream-failure tests.
pub const DEAD_UPSTREAM: &str = "http://127.0.0.1:9";

struct FakeMovie {
    id: String,
    title: String,
    kind: &'static str,
    categories: &'static str,
    year: i32,
    snake_case: bool,
}

impl FakeMovie {
    fn to_json(&self) -> Value {
        if self.snake_case {
            json!({
                "show_id": self.id,
                "title": self.title,
                "type": self.kind,
                "listed_in": self.categories,
                "release_year": self.year.to_string(),
                "description": format!("About {}", self.title),
            })
        } else {
            json!({
                "showId": self.id,
                "title": self.title,
                "type": self.kind,
                "listedIn": self.categories.split(", ").collect::<Vec<_>>(),
                "releaseYear": self.year,
                "description": format!("About {}", self.title),
            })
        }
    }
}

fn catalog() -> Vec<FakeMovie> {
    let mut movies = vec![
        FakeMovie {
            id: "s1".to_string(),
            title: "Heat".to_string(),
            kind: "Movie",
            categories: "Action & Adventure, Dramas",
            year: 1995,
            snake_case: true,
        },
        // stored under the short spelling so the TV fallback has something to find
        FakeMovie {
            id: "s2".to_string(),
            title: "The Office".to_string(),
            kind: "TV",
            categories: "TV Comedies",
            year: 2005,
            snake_case: false,
        },
        FakeMovie {
            id: "s3".to_string(),
            title: "Ronin".to_string(),
            kind: "Movie",
            categories: "Action & Adventure",
            year: 1998,
            snake_case: false,
        },
    ];

    for n in 1..=12 {
        movies.push(FakeMovie {
            id: format!("d{n}"),
            title: format!("Documentary {n}"),
            kind: "Movie",
            categories: "Documentaries",
            year: 2010,
            snake_case: n % 2 == 0,
        });
    }
    movies
}

async fn list_movies(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let page: usize = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = q.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);

    let wanted_categories: Vec<&str> = q
        .get("categories")
        .map(|c| c.split(',').map(str::trim).collect())
        .unwrap_or_default();

    let movies: Vec<Value> = catalog()
        .into_iter()
        .filter(|m| {
            q.get("title").is_none_or(|t| m.title.to_lowercase().contains(&t.to_lowercase()))
        })
        .filter(|m| q.get("type").is_none_or(|t| m.kind == t.as_str()))
        .filter(|m| q.get("release_year").is_none_or(|y| m.year.to_string() == *y))
        .filter(|m| wanted_categories.iter().all(|c| m.categories.contains(*c)))
        .skip((page.max(1) - 1) * per_page)
        .take(per_page)
        .map(|m| m.to_json())
        .collect();

    Json(json!({ "movies": movies }))
}

async fn movie_types() -> Json<Value> {
    Json(json!({ "types": ["Movie", "TV Show"] }))
}

async fn movie_by_id(
    State(lookups): State<Arc<AtomicUsize>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    lookups.fetch_add(1, Ordering::SeqCst);
    catalog()
        .into_iter()
        .find(|m| m.id == id)
        .map(|m| Json(m.to_json()))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Gemini-style endpoint. Taste follows the watchlist when the prompt names "Heat".
async fn generate(Path(_call): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    let recs = if prompt.contains("Heat") {
        json!([
            { "title": "Ronin", "description": "Mercenaries chase a briefcase.", "posterUrl": null, "showId": "bogus" },
            { "title": "Unknown Film", "description": "Not in the catalog." }
        ])
    } else {
        json!([{ "title": "The Office", "description": "A mockumentary." }])
    };

    let text = format!("Here you go:\n```json\n{recs}\n```");
    Json(json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }))
}

/// Catalog plus generative API on an ephemeral port. Returns the base URL and a
/// counter of by-id catalog lookups.
pub async fn spawn_upstream() -> (String, Arc<AtomicUsize>) {
    let lookups = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/types", get(movie_types))
        .route("/movies/{id}", get(movie_by_id))
        .route("/v1beta/models/{call}", post(generate))
        .with_state(lookups.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), lookups)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    catalog_lookups: Arc<AtomicUsize>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(&[]).await
}

/// Overrides are applied on top of the test defaults.
pub async fn spawn_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let (upstream, catalog_lookups) = spawn_upstream().await;

    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "sqlite::memory:".to_string()),
        ("MOVIE_API_URL", format!("{upstream}/movies")),
        ("CATALOG_RPS", "1000".to_string()),
        ("BCRYPT_COST", "4".to_string()),
        ("ADMIN_PASSWORD", ADMIN_PASSWORD.to_string()),
        ("GENAI_API_KEY", "test-key".to_string()),
        ("GENAI_BASE_URL", upstream.clone()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = reelwatch::build_state(config).await.unwrap();
    let server = client(&state);
    TestApp { server, state, catalog_lookups }
}

/// A separate browser with its own cookies against the same state.
pub fn client(state: &AppState) -> TestServer {
    TestServer::builder().save_cookies().build(reelwatch::router(state.clone())).unwrap()
}

impl TestApp {
    pub fn new_client(&self) -> TestServer {
        client(&self.state)
    }

    /// Number of `GET /movies/{id}` calls the fake catalog has served.
    pub fn catalog_lookups(&self) -> usize {
        self.catalog_lookups.load(Ordering::SeqCst)
    }
}

pub async fn register(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server.post("/register").form(&[("username", username), ("password", password)]).await
}

pub async fn login(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server.post("/login").form(&[("username", username), ("password", password)]).await
}

pub async fn register_and_login(server: &TestServer, username: &str, password: &str) {
    register(server, username, password).await;
    let resp = login(server, username, password).await;
    assert_eq!(location(&resp), "/search");
}

pub async fn login_admin(server: &TestServer) {
    let resp = login(server, "admin", ADMIN_PASSWORD).await;
    assert_eq!(location(&resp), "/admin");
}

pub fn location(resp: &TestResponse) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn add_json(server: &TestServer, show_id: &str) -> TestResponse {
    server.post("/add_to_watchlist").json(&json!({ "showId": show_id })).await
}

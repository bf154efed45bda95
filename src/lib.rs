pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod password;
pub mod pipeline;
pub mod recommender;
pub mod routes;
pub mod session;
pub mod store;
pub mod templates;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, post, put},
};
use cookie::Key;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{catalog::CatalogClient, config::Config, recommender::Recommender, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub catalog: Arc<CatalogClient>,
    pub recommender: Arc<Recommender>,
    pub key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Connects, migrates, seeds the admin profile and wires up the outbound clients.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let config = Arc::new(config);

    let http = reqwest::Client::builder()
        .user_agent("reelwatch/0.1")
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Store::new(db);
    db::seed_admin(&store, &config.admin_password, config.bcrypt_cost).await?;

    let catalog = CatalogClient::new(
        http.clone(),
        config.movie_api_url.clone(),
        config.catalog_rps,
        config.facet_ttl_secs,
    );

    let recommender = Recommender::new(
        http,
        config.genai_api_key.clone(),
        config.genai_base_url.clone(),
        config.genai_model.clone(),
    );

    let key = match &config.secret_key {
        Some(secret) => Key::derive_from(secret.as_bytes()),
        None => {
            warn!("no SECRET_KEY set - sessions will not survive a restart");
            Key::generate()
        },
    };

    Ok(AppState {
        config,
        store,
        catalog: Arc::new(catalog),
        recommender: Arc::new(recommender),
        key,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::auth::index))
        .route("/login", get(routes::auth::login_form).post(routes::auth::login))
        .route("/register", get(routes::auth::register_form).post(routes::auth::register))
        .route("/logout", get(routes::auth::logout))
        .route("/search", get(routes::search::search).post(routes::search::search_form))
        .route("/results", get(routes::search::results))
        .route("/my_watchlist", get(routes::watchlist::view))
        .route("/add_to_watchlist", post(routes::watchlist::add))
        .route("/remove_from_watchlist", post(routes::watchlist::remove))
        .route("/mark_watched", post(routes::watchlist::mark_watched))
        .route("/mark_unwatched", post(routes::watchlist::mark_unwatched))
        .route("/recommendations", get(routes::recommendations::recommendations))
        .route("/admin", get(routes::admin::dashboard))
        .route("/api/users", get(routes::admin::list_users))
        .route("/api/users/{id}/reset-password", post(routes::admin::reset_password))
        .route("/api/users/{id}/username", put(routes::admin::update_username))
        .route("/api/users/{id}", delete(routes::admin::delete_user))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

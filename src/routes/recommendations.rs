use std::collections::HashSet;

use axum::{extract::State, response::Html};
use tracing::{error, info};

use crate::{
    AppState,
    error::AppResult,
    models::Recommendation,
    pipeline,
    session::{CurrentUser, Session},
    templates,
};

const UNAVAILABLE: &str = "No recommendations available right now.";

pub async fn recommendations(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Html<String> {
    let recs = match recommend(&state, &session).await {
        Ok(recs) => recs,
        Err(err) => {
            error!(username = %session.username, error = %err, "recommendations failed");
            Vec::new()
        },
    };

    let message = recs.is_empty().then_some(UNAVAILABLE);
    Html(templates::recommendations_page(&session, &recs, message))
}

/// Watchlist titles feed the prompt, so the steps run one after another.
async fn recommend(state: &AppState, session: &Session) -> AppResult<Vec<Recommendation>> {
    if !state.recommender.is_enabled() {
        return Ok(Vec::new());
    }

    let entries = state.store.watchlist(&session.username).await?;
    let watchlist: HashSet<String> = entries.iter().map(|e| e.show_id.clone()).collect();

    let items =
        pipeline::resolve_watchlist(&state.catalog, entries, state.config.max_concurrent).await;
    let titles: Vec<String> = items
        .into_iter()
        .filter_map(|item| item.movie.map(|m| m.title))
        .filter(|title| !title.is_empty())
        .collect();

    let recs = state.recommender.recommend(&titles).await?;
    info!(username = %session.username, watchlist = titles.len(), count = recs.len(), "generated recommendations");

    Ok(pipeline::resolve_recommendations(&state.catalog, recs, &watchlist, state.config.max_concurrent).await)
}

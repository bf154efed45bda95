use axum::{extract::State, response::Html};
use axum_extra::extract::{Form, Query};
use tracing::{error, info};

use crate::{
    AppState,
    models::{CategoryForm, ResultsQuery, SearchPage},
    pipeline::{self, BROWSE_PER_PAGE, PER_PAGE},
    session::{CurrentUser, Session},
    templates,
};

pub async fn search(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(form): Query<CategoryForm>,
) -> Html<String> {
    browse(&state, &session, form.categories).await
}

pub async fn search_form(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Form(form): Form<CategoryForm>,
) -> Html<String> {
    browse(&state, &session, form.categories).await
}

/// Search form plus, when categories are picked, the first page of matching movies.
async fn browse(state: &AppState, session: &Session, categories: Vec<String>) -> Html<String> {
    let query = ResultsQuery { categories, ..Default::default() };
    let params = pipeline::build_params(&query, BROWSE_PER_PAGE);

    if params.categories.is_empty() {
        let facets = state.catalog.facets().await;
        return Html(templates::search_page(session, &facets, &[], None, None));
    }

    let (facets, results) = tokio::join!(
        state.catalog.facets(),
        pipeline::search(&state.catalog, &state.store, &session.username, &params)
    );

    let (results, message) = match results {
        Ok(results) => (results, None),
        Err(err) => {
            error!(username = %session.username, error = %err, "category browse failed");
            (empty_page(1), Some("Failed to fetch movies. Please try again later."))
        },
    };

    Html(templates::search_page(session, &facets, &params.categories, Some(&results), message))
}

pub async fn results(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<ResultsQuery>,
) -> Html<String> {
    let params = pipeline::build_params(&query, PER_PAGE);
    info!(username = %session.username, params = ?params, "search");

    let (facets, results) = tokio::join!(
        state.catalog.facets(),
        pipeline::search(&state.catalog, &state.store, &session.username, &params)
    );

    let (results, message) = match results {
        Ok(results) => (results, None),
        Err(err) => {
            error!(username = %session.username, error = %err, "search failed");
            (
                empty_page(params.page),
                Some("Error retrieving search results. Please try again later."),
            )
        },
    };

    Html(templates::results_page(&session, &query, &facets, &results, message))
}

fn empty_page(page: u32) -> SearchPage {
    SearchPage { hits: Vec::new(), page, has_next: false, has_prev: page > 1 }
}

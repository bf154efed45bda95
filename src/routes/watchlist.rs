use std::convert::Infallible;

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult, AppResult},
    models::ShowIdBody,
    pipeline,
    session::CurrentUser,
    templates,
};

const DEFAULT_NEXT: &str = "/my_watchlist";

/// Show id taken from a JSON or form body. Unparseable bodies count as missing.
pub struct ShowIdPayload {
    json: bool,
    body: ShowIdBody,
}

impl<S: Send + Sync> FromRequest<S> for ShowIdPayload {
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let body = if json {
            Json::<ShowIdBody>::from_request(req, state).await.map(|Json(b)| b).unwrap_or_default()
        } else {
            Form::<ShowIdBody>::from_request(req, state).await.map(|Form(b)| b).unwrap_or_default()
        };

        Ok(Self { json, body })
    }
}

impl ShowIdPayload {
    fn show_id(&self) -> ApiResult<&str> {
        self.body
            .show_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("No show ID provided"))
    }

    fn reply(&self, message: &str) -> Response {
        self.reply_with(StatusCode::OK, message)
    }

    /// JSON callers get `status`; form posts are always redirected.
    fn reply_with(&self, status: StatusCode, message: &str) -> Response {
        if self.json {
            return (status, Json(json!({ "message": message }))).into_response();
        }
        Redirect::to(safe_next(self.body.next.as_deref())).into_response()
    }
}

/// Only same-site paths are followed. Browsers treat `\` like `/`, so `/\host`
/// is as much a scheme-relative URL as `//host`.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path[1..].starts_with(['/', '\\'])
                && !path.chars().any(char::is_control) =>
        {
            path
        },
        _ => DEFAULT_NEXT,
    }
}

pub async fn view(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> AppResult<Html<String>> {
    let entries = state.store.watchlist(&session.username).await?;
    let items =
        pipeline::resolve_watchlist(&state.catalog, entries, state.config.max_concurrent).await;
    Ok(Html(templates::watchlist_page(&session, &items)))
}

pub async fn add(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: ShowIdPayload,
) -> ApiResult<Response> {
    let show_id = payload.show_id()?;
    let added = state.store.add_to_watchlist(&session.username, show_id).await?;

    if !added {
        return Ok(payload.reply_with(StatusCode::BAD_REQUEST, "Already in watchlist"));
    }
    info!(username = %session.username, show_id = %show_id, "added to watchlist");
    Ok(payload.reply("Successfully added to watchlist"))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: ShowIdPayload,
) -> ApiResult<Response> {
    let show_id = payload.show_id()?;
    let removed = state.store.remove_from_watchlist(&session.username, show_id).await?;
    info!(username = %session.username, show_id = %show_id, removed, "removed from watchlist");
    Ok(payload.reply("Successfully removed from watchlist"))
}

pub async fn mark_watched(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: ShowIdPayload,
) -> ApiResult<Response> {
    set_watched(&state, &session.username, payload, true).await
}

pub async fn mark_unwatched(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: ShowIdPayload,
) -> ApiResult<Response> {
    set_watched(&state, &session.username, payload, false).await
}

async fn set_watched(
    state: &AppState,
    username: &str,
    payload: ShowIdPayload,
    watched: bool,
) -> ApiResult<Response> {
    let show_id = payload.show_id()?;
    let updated = state.store.set_watched(username, show_id, watched).await?;
    info!(username = %username, show_id = %show_id, watched, updated, "updated watched flag");

    let message = if watched { "Marked as watched" } else { "Marked as unwatched" };
    Ok(payload.reply(message))
}

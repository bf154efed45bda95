use axum::{
    Json,
    extract::{Path, State},
    response::Html,
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult, AppResult},
    models::{RenameRequest, ResetPasswordRequest, UserSummary},
    password,
    session::AdminUser,
    templates,
};

pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
) -> AppResult<Html<String>> {
    let users: Vec<UserSummary> =
        state.store.list_profiles().await?.into_iter().map(UserSummary::from).collect();
    Ok(Html(templates::admin_page(&session, &users)))
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = state.store.list_profiles().await?.into_iter().map(UserSummary::from).collect();
    Ok(Json(users))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<ResetPasswordRequest>, ApiError>,
) -> ApiResult<Json<Value>> {
    let new_password = req
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("New password is required"))?;

    if state.store.find_profile(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let hash = password::hash(new_password, state.config.bcrypt_cost).await?;
    if !state.store.set_password(id, &hash).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!(admin = %session.username, user_id = id, "password reset");
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

pub async fn update_username(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<RenameRequest>, ApiError>,
) -> ApiResult<Json<Value>> {
    let new_username = req
        .new_username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("New username is required"))?;

    let renamed = state.store.rename_profile(id, &new_username).await?;
    info!(admin = %session.username, user_id = id, to = %renamed.username, "username updated");

    Ok(Json(json!({ "message": "Username updated successfully" })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ApiError>,
) -> ApiResult<Json<Value>> {
    let Some(target) = state.store.find_profile(id).await? else {
        return Err(ApiError::not_found("User not found"));
    };
    if target.id == session.user_id {
        return Err(ApiError::forbidden("Cannot delete your own account"));
    }
    if target.is_admin {
        return Err(ApiError::forbidden("Cannot delete admin user"));
    }

    if !state.store.delete_profile(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!(admin = %session.username, user_id = id, username = %target.username, "user deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

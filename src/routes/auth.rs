use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use sea_orm::SqlErr;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    AppState,
    entities::profile,
    error::{AppError, AppResult},
    models::Credentials,
    password,
    session::{self, Session},
    templates,
};

const REGISTERED: &str = "Registration successful. Please login now.";

pub async fn index(State(state): State<AppState>, jar: SignedCookieJar) -> Html<String> {
    let session = session::current(&state, &jar).await;
    Html(templates::index_page(session.as_ref()))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    success: Option<String>,
}

pub async fn login_form(Query(q): Query<LoginQuery>) -> Html<String> {
    Html(templates::login_page(None, q.success.as_deref()))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(creds): Form<Credentials>,
) -> Response {
    let username = creds.username.trim();
    if username.is_empty() || creds.password.is_empty() {
        return login_error("Missing username or password.");
    }

    match authenticate(&state, username, &creds.password).await {
        Ok(Some(profile)) => {
            let session = Session::for_profile(&profile);
            let target = if session.is_admin { "/admin" } else { "/search" };
            match session.store(jar) {
                Ok(jar) => {
                    info!(username = %session.username, admin = session.is_admin, "logged in");
                    (jar, Redirect::to(target)).into_response()
                },
                Err(err) => err.into_response(),
            }
        },
        Ok(None) => {
            warn!(username = %username, "failed login");
            login_error("Invalid credentials")
        },
        Err(err) => {
            error!(username = %username, error = %err, "login failed");
            login_error("An error occurred. Please try again.")
        },
    }
}

async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> AppResult<Option<profile::Model>> {
    let Some(profile) = state.store.find_profile_by_username(username).await? else {
        return Ok(None);
    };
    let ok = password::verify(password.to_string(), profile.password.clone()).await?;
    Ok(ok.then_some(profile))
}

fn login_error(message: &str) -> Response {
    Html(templates::login_page(Some(message), None)).into_response()
}

pub async fn register_form() -> Html<String> {
    Html(templates::register_page(None))
}

pub async fn register(
    State(state): State<AppState>,
    Form(creds): Form<Credentials>,
) -> AppResult<Response> {
    let username = creds.username.trim();
    if username.is_empty() || creds.password.is_empty() {
        return Ok(register_error("Username and password are required"));
    }

    if state.store.find_profile_by_username(username).await?.is_some() {
        return Ok(register_error("Username already exists"));
    }

    let hash = password::hash(creds.password, state.config.bcrypt_cost).await?;
    match state.store.create_profile(username, &hash, false).await {
        Ok(_) => {},
        // lost a race with a concurrent registration of the same name
        Err(AppError::Database(err))
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            return Ok(register_error("Username already exists"));
        },
        Err(err) => return Err(err),
    }

    info!(username = %username, "registered");
    let target = format!("/login?success={}", urlencoding::encode(REGISTERED));
    Ok(Redirect::to(&target).into_response())
}

fn register_error(message: &str) -> Response {
    Html(templates::register_page(Some(message))).into_response()
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    if let Some(session) = Session::from_jar(&jar) {
        info!(username = %session.username, "logged out");
    }
    (Session::clear(jar), Redirect::to("/login"))
}

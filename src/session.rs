use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{AppState, entities::profile, error::AppResult};

pub const SESSION_COOKIE: &str = "session";

const SESSION_DAYS: i64 = 7;

/// Signed-cookie session payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl Session {
    pub fn for_profile(profile: &profile::Model) -> Self {
        Self { user_id: profile.id, username: profile.username.clone(), is_admin: profile.is_admin }
    }

    pub fn from_jar(jar: &SignedCookieJar) -> Option<Self> {
        let cookie = jar.get(SESSION_COOKIE)?;
        decode(cookie.value())
    }

    pub fn store(&self, jar: SignedCookieJar) -> AppResult<SignedCookieJar> {
        let cookie = Cookie::build((SESSION_COOKIE, encode(self)?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(SESSION_DAYS));
        Ok(jar.add(cookie))
    }

    pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}

// JSON is percent-encoded so the cookie value stays within cookie-octets.
fn encode(session: &Session) -> AppResult<String> {
    let json = serde_json::to_string(session)?;
    Ok(urlencoding::encode(&json).into_owned())
}

fn decode(value: &str) -> Option<Session> {
    let json = urlencoding::decode(value).ok()?;
    serde_json::from_str(&json).ok()
}

/// Any logged-in user. Anonymous requests are redirected to `/login`.
pub struct CurrentUser(pub Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.key.clone());
        current(state, &jar).await.map(CurrentUser).ok_or_else(|| Redirect::to("/login"))
    }
}

/// The cookie only names the profile. Username and admin flag are re-read from
/// the store so deleted or renamed profiles take effect on the next request.
pub async fn current(state: &AppState, jar: &SignedCookieJar) -> Option<Session> {
    let cookie = Session::from_jar(jar)?;

    match state.store.find_profile(cookie.user_id).await {
        Ok(Some(profile)) => Some(Session::for_profile(&profile)),
        Ok(None) => {
            warn!(user_id = cookie.user_id, username = %cookie.username, "session for a deleted profile");
            None
        },
        Err(err) => {
            error!(user_id = cookie.user_id, error = %err, "failed to load session profile");
            None
        },
    }
}

/// A logged-in admin. Anonymous requests go to `/login`, everyone else to `/`.
pub struct AdminUser(pub Session);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        if !session.is_admin {
            warn!(username = %session.username, path = %parts.uri.path(), "non-admin tried an admin route");
            return Err(Redirect::to("/"));
        }
        Ok(AdminUser(session))
    }
}

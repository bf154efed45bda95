use serde::{Deserialize, Deserializer, Serialize};

/// A catalog entry. Upstream mixes `snake_case` and `camelCase` field names;
/// both are accepted and `camelCase` is emitted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(alias = "show_id", default, deserialize_with = "de_id")]
    pub show_id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(alias = "listed_in", default, deserialize_with = "de_categories")]
    pub listed_in: Vec<String>,
    #[serde(alias = "release_year", default, deserialize_with = "de_year")]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(alias = "date_added", default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub movie: Movie,
    pub in_watchlist: bool,
}

#[derive(Clone, Debug)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Normalized query sent to the catalog's `/movies` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub title: Option<String>,
    pub kind: Option<String>,
    pub categories: Vec<String>,
    pub release_year: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl SearchParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.to_string()), ("per_page", self.per_page.to_string())];
        if let Some(title) = &self.title {
            query.push(("title", title.clone()));
        }
        if let Some(kind) = &self.kind {
            query.push(("type", kind.clone()));
        }
        if !self.categories.is_empty() {
            query.push(("categories", self.categories.join(",")));
        }
        if let Some(year) = &self.release_year {
            query.push(("release_year", year.clone()));
        }
        query
    }
}

/// Raw `/results` query string. `categories` may repeat.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub release_year: String,
    #[serde(default)]
    pub page: Option<String>,
}

impl ResultsQuery {
    /// Invalid or missing pages fall back to 1.
    pub fn page(&self) -> u32 {
        self.page.as_deref().and_then(|p| p.trim().parse().ok()).unwrap_or(1).max(1)
    }

    /// Query string for the same search on another page.
    pub fn to_query_string(&self, page: u32) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        if !self.title.is_empty() {
            pairs.push(("title", &self.title));
        }
        if !self.kind.is_empty() {
            pairs.push(("type", &self.kind));
        }
        for category in &self.categories {
            pairs.push(("categories", category));
        }
        if !self.release_year.is_empty() {
            pairs.push(("release_year", &self.release_year));
        }
        let page = page.to_string();
        pairs.push(("page", &page));

        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: Vec<String>,
    pub types: Vec<String>,
}

impl Facets {
    pub fn fallback() -> Self {
        Self { categories: Vec::new(), types: vec!["Movie".to_string(), "TV Show".to_string()] }
    }
}

#[derive(Clone, Debug)]
pub struct WatchlistItem {
    pub show_id: String,
    pub watched: bool,
    pub movie: Option<Movie>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "poster_url", default)]
    pub poster_url: Option<String>,
    #[serde(alias = "show_id", default, deserialize_with = "de_opt_id")]
    pub show_id: Option<String>,
    #[serde(skip_deserializing)]
    pub in_watchlist: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl From<crate::entities::profile::Model> for UserSummary {
    fn from(profile: crate::entities::profile::Model) -> Self {
        Self { id: profile.id, username: profile.username, is_admin: profile.is_admin }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(rename = "newPassword", default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameRequest {
    #[serde(rename = "newUsername", default)]
    pub new_username: Option<String>,
}

/// Body of the watchlist mutation routes, sent either as JSON or as a form.
#[derive(Debug, Default, Deserialize)]
pub struct ShowIdBody {
    #[serde(rename = "showId", alias = "show_id", default, deserialize_with = "de_opt_id")]
    pub show_id: Option<String>,
    /// Where form submissions go afterwards.
    #[serde(default)]
    pub next: Option<String>,
}

pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|c| !c.is_empty()).map(str::to_string).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Text(s) => s.trim().to_string(),
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<IdRepr>::deserialize(d)?.map(IdRepr::into_string).unwrap_or_default())
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(d)?.map(IdRepr::into_string).filter(|s| !s.is_empty()))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn de_categories<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Text(s)) => split_categories(&s),
        Some(Raw::List(list)) => list
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}

fn de_year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Number(n)) => i32::try_from(n).ok(),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

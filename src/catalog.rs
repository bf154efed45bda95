use std::{collections::BTreeSet, num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    error::AppResult,
    models::{Facets, Movie, SearchParams},
};

/// Spellings tried, in order, when a `TV Show` search comes back empty.
const TV_ALTERNATIVES: [&str; 5] = ["TV", "tv show", "tv_show", "tvshow", "series"];

const FACET_SAMPLE_SIZE: u32 = 1000;

/// Client for the external movie catalog REST API.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    facets: RwLock<Option<(i64, Facets)>>,
    facet_ttl_seconds: i64,
}

impl CatalogClient {
    pub fn new(client: reqwest::Client, base_url: String, rps: u32, facet_ttl_seconds: i64) -> Self {
        let rps = NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
            facets: RwLock::new(None),
            facet_ttl_seconds,
        }
    }

    /// Runs one search, retrying alternative spellings for empty `TV Show` results.
    pub async fn search(&self, params: &SearchParams) -> AppResult<Vec<Movie>> {
        let movies = self.fetch_movies(&params.to_query()).await?;
        debug!(count = movies.len(), page = params.page, "catalog search");

        if !movies.is_empty() || params.kind.as_deref() != Some("TV Show") {
            return Ok(movies);
        }

        for alt in TV_ALTERNATIVES {
            let mut alt_params = params.clone();
            alt_params.kind = Some(alt.to_string());
            match self.fetch_movies(&alt_params.to_query()).await {
                Ok(found) if !found.is_empty() => {
                    debug!(alt = %alt, count = found.len(), "alternative TV spelling matched");
                    return Ok(found);
                },
                Ok(_) => {},
                Err(err) => warn!(alt = %alt, error = %err, "alternative TV spelling failed"),
            }
        }

        Ok(Vec::new())
    }

    /// Fetches one movie by id; `None` when the catalog doesn't know it.
    pub async fn movie(&self, show_id: &str) -> AppResult<Option<Movie>> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, urlencoding::encode(show_id));
        let resp = self.client.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let movie: Movie = resp.error_for_status()?.json().await?;
        Ok(Some(movie))
    }

    /// First catalog entry matching `title`.
    pub async fn find_by_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let query = [("title", title.to_string()), ("per_page", "1".to_string())];
        Ok(self.fetch_movies(&query).await?.into_iter().next())
    }

    /// Category and type lists for the search form. Never fails; falls back to defaults.
    pub async fn facets(&self) -> Facets {
        let now = jiff::Timestamp::now().as_second();
        if let Some((fetched_at, facets)) = self.facets.read().await.as_ref() {
            if now.saturating_sub(*fetched_at) <= self.facet_ttl_seconds {
                return facets.clone();
            }
        }

        match self.load_facets().await {
            Ok(facets) => {
                *self.facets.write().await = Some((now, facets.clone()));
                facets
            },
            Err(err) => {
                warn!(error = %err, "failed to load search facets");
                Facets::fallback()
            },
        }
    }

    async fn load_facets(&self) -> AppResult<Facets> {
        let sample = self
            .fetch_movies(&[("per_page", FACET_SAMPLE_SIZE.to_string())])
            .await?;

        let categories: BTreeSet<String> =
            sample.iter().flat_map(|m| m.listed_in.iter().cloned()).collect();

        let types = match self.fetch_types().await {
            Ok(types) if !types.is_empty() => types,
            Ok(_) => sampled_types(&sample),
            Err(err) => {
                warn!(error = %err, "catalog has no types endpoint, inferring from sample");
                sampled_types(&sample)
            },
        };

        let types = if types.is_empty() { Facets::fallback().types } else { types };
        Ok(Facets { categories: categories.into_iter().collect(), types })
    }

    async fn fetch_types(&self) -> AppResult<Vec<String>> {
        self.limiter.until_ready().await;

        let url = format!("{}/types", self.base_url);
        let resp: TypesResponse =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(resp.types)
    }

    async fn fetch_movies(&self, query: &[(&str, String)]) -> AppResult<Vec<Movie>> {
        self.limiter.until_ready().await;

        debug!(url = %self.base_url, ?query, "querying catalog");
        let resp: MoviesResponse = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.movies)
    }
}

fn sampled_types(sample: &[Movie]) -> Vec<String> {
    let types: BTreeSet<String> = sample.iter().filter_map(|m| m.kind.clone()).collect();
    types.into_iter().collect()
}

#[derive(Debug, Deserialize)]
struct MoviesResponse {
    #[serde(default)]
    movies: Vec<Movie>,
}

#[derive(Debug, Deserialize)]
struct TypesResponse {
    #[serde(default)]
    types: Vec<String>,
}

use std::collections::HashSet;

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    catalog::CatalogClient,
    entities::watchlist,
    error::AppResult,
    models::{Movie, Recommendation, ResultsQuery, SearchHit, SearchPage, SearchParams, WatchlistItem},
    store::Store,
};

pub const PER_PAGE: u32 = 10;

/// Page size used by `/search` when browsing by category.
pub const BROWSE_PER_PAGE: u32 = 100;

/// Maps the usual spellings of the two catalog types onto the catalog's own.
pub fn normalize_type(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "tv" | "tv show" | "tvshow" => "TV Show".to_string(),
        "movie" => "Movie".to_string(),
        _ => raw.trim().to_string(),
    }
}

pub fn build_params(q: &ResultsQuery, per_page: u32) -> SearchParams {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    SearchParams {
        title: non_empty(&q.title),
        kind: non_empty(&q.kind).map(|k| normalize_type(&k)),
        categories: q
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        release_year: non_empty(&q.release_year),
        page: q.page(),
        per_page,
    }
}

/// Flags each movie against the watchlist and derives pagination from the upstream page size.
pub fn merge_page(movies: Vec<Movie>, watchlist: &HashSet<String>, params: &SearchParams) -> SearchPage {
    let has_next = movies.len() == params.per_page as usize;
    let hits = movies
        .into_iter()
        .map(|movie| {
            let in_watchlist = watchlist.contains(&movie.show_id);
            SearchHit { movie, in_watchlist }
        })
        .collect();

    SearchPage { hits, page: params.page, has_next, has_prev: params.page > 1 }
}

/// Catalog search joined with the user's watchlist. Only a catalog failure is an error;
/// a watchlist failure just leaves every hit unflagged.
pub async fn search(
    catalog: &CatalogClient,
    store: &Store,
    username: &str,
    params: &SearchParams,
) -> AppResult<SearchPage> {
    let (movies, watchlist) = tokio::join!(catalog.search(params), store.watchlist_ids(username));

    let watchlist = watchlist.unwrap_or_else(|err| {
        warn!(username = %username, error = %err, "failed to load watchlist status");
        HashSet::new()
    });

    let movies = movies?;
    debug!(results = movies.len(), in_watchlist = watchlist.len(), "merging search results");
    Ok(merge_page(movies, &watchlist, params))
}

/// Resolves catalog details for watchlist rows, keeping row order.
pub async fn resolve_watchlist(
    catalog: &CatalogClient,
    entries: Vec<watchlist::Model>,
    max_concurrent: usize,
) -> Vec<WatchlistItem> {
    debug!(entries = entries.len(), "resolving watchlist details");

    stream::iter(entries)
        .map(|entry| async move {
            let movie = match catalog.movie(&entry.show_id).await {
                Ok(movie) => movie,
                Err(err) => {
                    warn!(show_id = %entry.show_id, error = %err, "failed to fetch movie details");
                    None
                },
            };
            WatchlistItem { show_id: entry.show_id, watched: entry.watched, movie }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}

/// Matches generated recommendations against the catalog by title so they can be
/// added to the watchlist. Unmatched ones keep no show id.
pub async fn resolve_recommendations(
    catalog: &CatalogClient,
    recommendations: Vec<Recommendation>,
    watchlist: &HashSet<String>,
    max_concurrent: usize,
) -> Vec<Recommendation> {
    stream::iter(recommendations)
        .map(|mut rec| async move {
            match catalog.find_by_title(&rec.title).await {
                Ok(Some(movie)) => {
                    if rec.description.is_none() {
                        rec.description = movie.description.clone();
                    }
                    rec.in_watchlist = watchlist.contains(&movie.show_id);
                    rec.show_id = Some(movie.show_id);
                },
                Ok(None) => {
                    debug!(title = %rec.title, "recommendation not in catalog");
                    rec.show_id = None;
                },
                Err(err) => {
                    warn!(title = %rec.title, error = %err, "failed to look up recommendation");
                    rec.show_id = None;
                },
            }
            rec
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}

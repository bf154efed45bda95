use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    models::{Facets, Recommendation, ResultsQuery, SearchHit, SearchPage, UserSummary, WatchlistItem},
    session::Session,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const PRIMARY_BUTTON: &str =
    "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

pub fn index_page(session: Option<&Session>) -> String {
    page(
        "Reelwatch",
        session,
        html! {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-3xl font-bold text-gray-900" { "Reelwatch" }
                    p class="mt-2 text-gray-600" { "Search the catalog and keep track of what you want to watch." }
                    div class="mt-8 flex gap-4" {
                        @if session.is_some() {
                            a class=(PRIMARY_BUTTON) href="/search" { "Search movies" }
                            a class="rounded-md border border-gray-300 px-4 py-2 text-gray-700" href="/my_watchlist" { "My watchlist" }
                        } @else {
                            a class=(PRIMARY_BUTTON) href="/login" { "Log in" }
                            a class="rounded-md border border-gray-300 px-4 py-2 text-gray-700" href="/register" { "Register" }
                        }
                    }
                }
            }
        },
    )
}

pub fn login_page(error: Option<&str>, success: Option<&str>) -> String {
    page(
        "Log in",
        None,
        html! {
            div class="max-w-md mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "Log in" }
                    @if let Some(message) = success {
                        (banner(Banner::Success, message))
                    }
                    @if let Some(message) = error {
                        (banner(Banner::Error, message))
                    }
                    form class="mt-6 space-y-6" method="post" action="/login" {
                        (credential_fields())
                        button class=(format!("w-full {PRIMARY_BUTTON}")) type="submit" { "Log in" }
                    }
                    p class="mt-6 text-sm text-gray-600" {
                        "No account? " a class="text-blue-600 hover:text-blue-800" href="/register" { "Register" }
                    }
                }
            }
        },
    )
}

pub fn register_page(error: Option<&str>) -> String {
    page(
        "Register",
        None,
        html! {
            div class="max-w-md mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "Register" }
                    @if let Some(message) = error {
                        (banner(Banner::Error, message))
                    }
                    form class="mt-6 space-y-6" method="post" action="/register" {
                        (credential_fields())
                        button class=(format!("w-full {PRIMARY_BUTTON}")) type="submit" { "Create account" }
                    }
                    p class="mt-6 text-sm text-gray-600" {
                        "Already registered? " a class="text-blue-600 hover:text-blue-800" href="/login" { "Log in" }
                    }
                }
            }
        },
    )
}

pub fn search_page(
    session: &Session,
    facets: &Facets,
    selected: &[String],
    results: Option<&SearchPage>,
    message: Option<&str>,
) -> String {
    let query = ResultsQuery { categories: selected.to_vec(), ..Default::default() };

    page(
        "Search",
        Some(session),
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                h1 class="text-3xl font-bold text-gray-900" { "Search" }
                p class="mt-2 text-gray-600" { "Welcome, " (session.username) "." }

                div class="mt-8 bg-white shadow rounded-lg p-6" {
                    (search_form(facets, &query))
                }

                div class="mt-8 bg-white shadow rounded-lg p-6" {
                    h2 class="text-lg font-semibold text-gray-900" { "Browse by category" }
                    form class="mt-4" method="post" action="/search" {
                        (category_checkboxes(facets, selected))
                        button class=(format!("mt-4 {PRIMARY_BUTTON}")) type="submit" { "Browse" }
                    }
                }

                @if let Some(message) = message {
                    (banner(Banner::Error, message))
                }

                @if let Some(results) = results {
                    div class="mt-8 space-y-4" {
                        @if results.hits.is_empty() {
                            p class="text-gray-600" { "No movies found in the selected categories." }
                        }
                        @for hit in &results.hits {
                            (movie_card(hit, "/search"))
                        }
                    }
                }
            }
        },
    )
}

pub fn results_page(
    session: &Session,
    query: &ResultsQuery,
    facets: &Facets,
    results: &SearchPage,
    message: Option<&str>,
) -> String {
    let here = format!("/results?{}", query.to_query_string(results.page));

    page(
        "Results",
        Some(session),
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                div class="flex items-start justify-between gap-6" {
                    h1 class="text-3xl font-bold text-gray-900" { "Results" }
                    a class="text-sm text-blue-600 hover:text-blue-800" href="/search" { "New search" }
                }

                div class="mt-6 bg-white shadow rounded-lg p-6" {
                    (search_form(facets, query))
                }

                @if let Some(message) = message {
                    (banner(Banner::Error, message))
                }

                @if results.hits.is_empty() {
                    div class="mt-10 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-600" { "No movies found matching your search criteria." }
                    }
                } @else {
                    div class="mt-10 space-y-4" {
                        @for hit in &results.hits {
                            (movie_card(hit, &here))
                        }
                    }
                }

                div class="mt-8 flex justify-between" {
                    @if results.has_prev {
                        a class="text-blue-600 hover:text-blue-800" href=(format!("/results?{}", query.to_query_string(results.page - 1))) { "← Previous" }
                    } @else {
                        span {}
                    }
                    span class="text-sm text-gray-500" { "Page " (results.page) }
                    @if results.has_next {
                        a class="text-blue-600 hover:text-blue-800" href=(format!("/results?{}", query.to_query_string(results.page + 1))) { "Next →" }
                    } @else {
                        span {}
                    }
                }
            }
        },
    )
}

pub fn watchlist_page(session: &Session, items: &[WatchlistItem]) -> String {
    page(
        "My watchlist",
        Some(session),
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                h1 class="text-3xl font-bold text-gray-900" { "My watchlist" }

                @if items.is_empty() {
                    div class="mt-10 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-600" { "Your watchlist is empty." }
                        a class="mt-4 inline-block text-blue-600 hover:text-blue-800" href="/search" { "Find something to watch" }
                    }
                } @else {
                    div class="mt-10 space-y-4" {
                        @for item in items {
                            (watchlist_card(item))
                        }
                    }
                }
            }
        },
    )
}

pub fn recommendations_page(session: &Session, recs: &[Recommendation], message: Option<&str>) -> String {
    page(
        "Recommendations",
        Some(session),
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                h1 class="text-3xl font-bold text-gray-900" { "Recommended for you" }

                @if let Some(message) = message {
                    div class="mt-10 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-600" { (message) }
                    }
                }

                div class="mt-10 grid gap-4 md:grid-cols-2" {
                    @for rec in recs {
                        div class="bg-white shadow rounded-lg p-6 flex gap-4" {
                            @if let Some(poster) = &rec.poster_url {
                                img class="h-32 w-24 rounded object-cover" src=(poster) alt=(rec.title);
                            }
                            div {
                                h2 class="text-xl font-semibold text-gray-900" { (rec.title) }
                                @if let Some(description) = &rec.description {
                                    p class="mt-2 text-sm text-gray-600" { (description) }
                                }
                                @if let Some(show_id) = &rec.show_id {
                                    div class="mt-4" {
                                        (watchlist_button(show_id, rec.in_watchlist, "/recommendations"))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn admin_page(session: &Session, users: &[UserSummary]) -> String {
    page(
        "User Management",
        Some(session),
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                h1 class="text-3xl font-bold text-gray-900" { "User Management" }
                p class="mt-2 text-gray-600" { "Signed in as " (session.username) "." }

                div class="mt-8 bg-white shadow rounded-lg overflow-hidden" {
                    table class="min-w-full divide-y divide-gray-200" {
                        thead class="bg-gray-50" {
                            tr {
                                th class="px-6 py-3 text-left text-xs font-medium uppercase text-gray-500" { "ID" }
                                th class="px-6 py-3 text-left text-xs font-medium uppercase text-gray-500" { "Username" }
                                th class="px-6 py-3 text-left text-xs font-medium uppercase text-gray-500" { "Role" }
                                th class="px-6 py-3" {}
                            }
                        }
                        tbody id="userTableBody" class="divide-y divide-gray-200" {
                            @for user in users {
                                tr {
                                    td class="px-6 py-4 text-sm text-gray-500" { (user.id) }
                                    td class="px-6 py-4 text-sm text-gray-900 username-cell" { (user.username) }
                                    td class="px-6 py-4 text-sm text-gray-500" {
                                        @if user.is_admin { "Admin" } @else { "User" }
                                    }
                                    td class="px-6 py-4 text-right text-sm space-x-3" {
                                        button class="change-password-btn text-blue-600 hover:text-blue-800" data-user-id=(user.id) { "Reset password" }
                                        button class="rename-user-btn text-blue-600 hover:text-blue-800" data-user-id=(user.id) { "Rename" }
                                        @if !user.is_admin && user.id != session.user_id {
                                            button class="delete-user-btn text-red-600 hover:text-red-800" data-user-id=(user.id) { "Delete" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            script { (PreEscaped(ADMIN_JS)) }
        },
    )
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        None,
        html! {
            div class="max-w-xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "Error" }
                    p class="mt-4 text-gray-700" { (message) }
                    a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                }
            }
        },
    )
}

fn page(title: &str, session: Option<&Session>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Reelwatch" }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                @if let Some(session) = session {
                    (navbar(session))
                }
                (body)
            }
        }
    }
    .into_string()
}

fn navbar(session: &Session) -> Markup {
    html! {
        nav class="bg-white shadow" {
            div class="max-w-5xl mx-auto px-6 py-4 flex items-center justify-between" {
                a class="text-lg font-bold text-gray-900" href="/" { "Reelwatch" }
                div class="flex items-center gap-6 text-sm" {
                    a class="text-gray-700 hover:text-gray-900" href="/search" { "Search" }
                    a class="text-gray-700 hover:text-gray-900" href="/my_watchlist" { "My watchlist" }
                    a class="text-gray-700 hover:text-gray-900" href="/recommendations" { "Recommendations" }
                    @if session.is_admin {
                        a class="text-gray-700 hover:text-gray-900" href="/admin" { "Admin" }
                    }
                    span class="text-gray-500" { (session.username) }
                    a class="text-red-600 hover:text-red-800" href="/logout" { "Log out" }
                }
            }
        }
    }
}

fn credential_fields() -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for="username" { "Username" }
            input class=(INPUT) name="username" id="username" autocomplete="username" required;
        }
        div {
            label class="block text-sm font-medium text-gray-700" for="password" { "Password" }
            input class=(INPUT) type="password" name="password" id="password" required;
        }
    }
}

fn search_form(facets: &Facets, query: &ResultsQuery) -> Markup {
    html! {
        form class="space-y-4" method="get" action="/results" {
            div class="grid gap-4 md:grid-cols-3" {
                div {
                    label class="block text-sm font-medium text-gray-700" for="title" { "Title" }
                    input class=(INPUT) name="title" id="title" value=(query.title);
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="type" { "Type" }
                    select class=(INPUT) name="type" id="type" {
                        option value="" { "Any" }
                        @for kind in &facets.types {
                            option value=(kind) selected[*kind == query.kind] { (kind) }
                        }
                    }
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="release_year" { "Release year" }
                    input class=(INPUT) name="release_year" id="release_year" inputmode="numeric" value=(query.release_year);
                }
            }
            (category_checkboxes(facets, &query.categories))
            button class=(PRIMARY_BUTTON) type="submit" { "Search" }
        }
    }
}

fn category_checkboxes(facets: &Facets, selected: &[String]) -> Markup {
    html! {
        @if !facets.categories.is_empty() {
            fieldset class="grid gap-2 md:grid-cols-3" {
                @for category in &facets.categories {
                    label class="flex items-center gap-2 text-sm text-gray-700" {
                        input type="checkbox" name="categories" value=(category) checked[selected.contains(category)];
                        (category)
                    }
                }
            }
        }
    }
}

fn movie_card(hit: &SearchHit, next: &str) -> Markup {
    let movie = &hit.movie;
    html! {
        div class="bg-white shadow rounded-lg p-6" {
            div class="flex items-start justify-between gap-4" {
                div {
                    h2 class="text-xl font-semibold text-gray-900" {
                        (movie.title)
                        @if let Some(year) = movie.release_year {
                            span class="ml-2 font-normal text-gray-500" { "(" (year) ")" }
                        }
                    }
                    p class="mt-1 text-sm text-gray-500" {
                        @if let Some(kind) = &movie.kind { (kind) }
                        @if !movie.listed_in.is_empty() { " · " (movie.listed_in.join(", ")) }
                    }
                    @if let Some(description) = &movie.description {
                        p class="mt-3 text-gray-700" { (description) }
                    }
                }
                (watchlist_button(&movie.show_id, hit.in_watchlist, next))
            }
        }
    }
}

fn watchlist_card(item: &WatchlistItem) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex items-start justify-between gap-4" {
            div {
                @match &item.movie {
                    Some(movie) => {
                        h2 class="text-xl font-semibold text-gray-900" {
                            (movie.title)
                            @if let Some(year) = movie.release_year {
                                span class="ml-2 font-normal text-gray-500" { "(" (year) ")" }
                            }
                        }
                        @if let Some(description) = &movie.description {
                            p class="mt-3 text-gray-700" { (description) }
                        }
                    }
                    None => {
                        h2 class="text-xl font-semibold text-gray-900" { "Unknown title" }
                        p class="mt-1 text-sm text-gray-500" { "Show ID " (item.show_id) }
                    }
                }
                @if item.watched {
                    span class="mt-3 inline-block rounded bg-green-100 px-2 py-1 text-xs text-green-800" { "Watched" }
                }
            }
            div class="flex flex-col gap-2" {
                @let toggle = if item.watched { ("/mark_unwatched", "Mark unwatched") } else { ("/mark_watched", "Mark watched") };
                (show_form(toggle.0, &item.show_id, "/my_watchlist", toggle.1, "text-blue-600 hover:text-blue-800"))
                (show_form("/remove_from_watchlist", &item.show_id, "/my_watchlist", "Remove", "text-red-600 hover:text-red-800"))
            }
        }
    }
}

fn watchlist_button(show_id: &str, in_watchlist: bool, next: &str) -> Markup {
    if in_watchlist {
        show_form("/remove_from_watchlist", show_id, next, "Remove from watchlist", "text-red-600 hover:text-red-800 text-sm")
    } else {
        show_form("/add_to_watchlist", show_id, next, "Add to watchlist", "text-blue-600 hover:text-blue-800 text-sm")
    }
}

fn show_form(action: &str, show_id: &str, next: &str, label: &str, class: &str) -> Markup {
    html! {
        form method="post" action=(action) {
            input type="hidden" name="showId" value=(show_id);
            input type="hidden" name="next" value=(next);
            button class=(class) type="submit" { (label) }
        }
    }
}

enum Banner {
    Success,
    Error,
}

fn banner(kind: Banner, message: &str) -> Markup {
    let class = match kind {
        Banner::Success => "mt-4 rounded-md bg-green-50 p-3 text-sm text-green-800",
        Banner::Error => "mt-4 rounded-md bg-red-50 p-3 text-sm text-red-800",
    };
    html! { div class=(class) role="alert" { (message) } }
}

const ADMIN_JS: &str = r#"
document.addEventListener('DOMContentLoaded', function () {
  const table = document.getElementById('userTableBody');
  if (!table) return;

  function send(url, method, body) {
    return fetch(url, {
      method: method,
      headers: { 'Content-Type': 'application/json' },
      body: body ? JSON.stringify(body) : undefined,
    }).then(function (resp) {
      return resp.json().then(function (data) {
        if (!resp.ok) throw new Error(data.error || 'Request failed');
        return data;
      });
    });
  }

  table.addEventListener('click', function (event) {
    const reset = event.target.closest('.change-password-btn');
    const rename = event.target.closest('.rename-user-btn');
    const remove = event.target.closest('.delete-user-btn');

    if (reset) {
      const password = prompt('New password');
      if (!password) return;
      send('/api/users/' + reset.dataset.userId + '/reset-password', 'POST', { newPassword: password })
        .then(function (data) { alert(data.message); })
        .catch(function (err) { alert(err.message); });
    }

    if (rename) {
      const username = prompt('New username');
      if (!username) return;
      send('/api/users/' + rename.dataset.userId + '/username', 'PUT', { newUsername: username })
        .then(function () { rename.closest('tr').querySelector('.username-cell').textContent = username; })
        .catch(function (err) { alert(err.message); });
    }

    if (remove && confirm('Are you sure you want to delete this user?')) {
      send('/api/users/' + remove.dataset.userId, 'DELETE')
        .then(function () { remove.closest('tr').remove(); })
        .catch(function (err) { alert(err.message); });
    }
  });
});
"#;

pub mod admin;
pub mod auth;
pub mod recommendations;
pub mod search;
pub mod watchlist;

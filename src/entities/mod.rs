pub mod profile;
pub mod watchlist;

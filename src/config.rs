use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub movie_api_url: String,
    pub catalog_rps: u32,
    pub http_timeout_secs: u64,
    pub max_concurrent: usize,
    pub facet_ttl_secs: i64,
    pub secret_key: Option<String>,
    pub admin_password: String,
    pub bcrypt_cost: u32,
    pub genai_api_key: String,
    pub genai_base_url: String,
    pub genai_model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let database_url = var("DATABASE_URL", "sqlite://reelwatch.db?mode=rwc");
        let movie_api_url = var("MOVIE_API_URL", "http://localhost:5000/movies");

        let catalog_rps: u32 = parse_or(&lookup, "CATALOG_RPS", 10)?;
        let http_timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?;
        let max_concurrent: usize = parse_or(&lookup, "MAX_CONCURRENT_REQUESTS", 5)?;
        let facet_ttl_secs: i64 = parse_or(&lookup, "FACET_TTL_SECS", 300)?;
        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        let secret_key = lookup("SECRET_KEY").filter(|s| !s.trim().is_empty());
        if let Some(secret) = &secret_key {
            anyhow::ensure!(secret.len() >= 32, "SECRET_KEY must be at least 32 bytes");
        }

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            movie_api_url,
            catalog_rps,
            http_timeout_secs,
            max_concurrent,
            facet_ttl_secs,
            secret_key,
            admin_password: var("ADMIN_PASSWORD", "admin123"),
            bcrypt_cost,
            genai_api_key: var("GENAI_API_KEY", ""),
            genai_base_url: var("GENAI_BASE_URL", "https://generativelanguage.googleapis.com"),
            genai_model: var("GENAI_MODEL", "gemini-2.0-flash"),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

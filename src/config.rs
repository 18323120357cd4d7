use anyhow::Context;

// The catalog allows ~50 requests per second; staying under 35 leaves room
// for other consumers of the same key. Slow mode is for multi-hour batch
// jobs that should not crowd anything out.
const DEFAULT_RPS: u32 = 35;
const SLOW_MODE_RPS: u32 = 20;

#[derive(Clone, Debug)]
pub struct Config {
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_export_base_url: String,
    pub database_url: String,
    pub tmdb_rps: u32,
    pub max_concurrent: usize,
    pub max_cast_members: usize,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_export_base_url = std::env::var("TMDB_EXPORT_BASE_URL")
            .unwrap_or_else(|_| "http://files.tmdb.org/p/exports".to_string());

        let db_mode = std::env::var("DB_MODE").unwrap_or_else(|_| "local".to_string());
        let database_url = match db_mode.as_str() {
            "remote" => std::env::var("REMOTE_DATABASE_URL")
                .context("REMOTE_DATABASE_URL is required when DB_MODE=remote")?,
            _ => std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://backlot.db?mode=rwc".to_string()),
        };

        let tmdb_rps: u32 = std::env::var("TMDB_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RPS)
            .clamp(1, DEFAULT_RPS);

        let max_concurrent: usize =
            std::env::var("MAX_CONCURRENT_FETCHES").ok().and_then(|s| s.parse().ok()).unwrap_or(8);

        let max_cast_members: usize =
            std::env::var("MAX_CAST_MEMBERS").ok().and_then(|s| s.parse().ok()).unwrap_or(8);

        let http_timeout_secs: u64 =
            std::env::var("TMDB_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(30);

        Ok(Self {
            tmdb_access_token,
            tmdb_base_url,
            tmdb_export_base_url,
            database_url,
            tmdb_rps,
            max_concurrent,
            max_cast_members,
            http_timeout_secs,
        })
    }

    pub fn rps(&self, slow_mode: bool) -> u32 {
        if slow_mode { self.tmdb_rps.min(SLOW_MODE_RPS) } else { self.tmdb_rps }
    }
}

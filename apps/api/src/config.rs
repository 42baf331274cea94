use anyhow::{bail, Context, Result};

pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_USER_AGENT: &str = concat!("companion/", env!("CARGO_PKG_VERSION"));

/// Which backend store the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// `YOUTUBE_API_KEY` is optional: the service starts without it
/// and every proxy call then fails with a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub youtube_api_key: Option<String>,
    pub youtube_api_base: String,
    /// Remote proxy endpoint for the dashboard. In-process dispatch when unset.
    pub proxy_url: Option<String>,
    pub user_agent: String,
    pub event_buffer_capacity: usize,
    /// Seeds one session into the in-memory store for local runs.
    pub dev_session_token: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend =
            StoreBackend::parse(&std::env::var("STORE_BACKEND").unwrap_or_default())?;
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            store_backend,
            database_url,
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            youtube_api_base: optional_env("YOUTUBE_API_BASE")
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_BASE.to_string()),
            proxy_url: optional_env("PROXY_URL"),
            user_agent: optional_env("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            event_buffer_capacity: std::env::var("EVENT_BUFFER_CAPACITY")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<usize>()
                .context("EVENT_BUFFER_CAPACITY must be a positive integer")?,
            dev_session_token: optional_env("DEV_SESSION_TOKEN"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

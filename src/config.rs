// src/config.rs
use anyhow::Context;

/// Service configuration read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub gemini_api_key: String,
}

impl Config {
    /// | Env var          | Default                  |
    /// |------------------|--------------------------|
    /// | `HOST`           | `0.0.0.0`                |
    /// | `PORT`           | `8080`                   |
    /// | `REDIS_URL`      | `redis://127.0.0.1:6379` |
    /// | `GEMINI_API_KEY` | required                 |
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let gemini_api_key =
            std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        Ok(Self {
            host,
            port,
            redis_url,
            gemini_api_key,
        })
    }
}

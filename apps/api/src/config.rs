use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_MODEL: &str = "sonar-pro";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion_api_key: String,
    pub completion_model: String,
    pub completion_base_url: String,
    /// Per-call token budget handed to the completion service.
    pub completion_max_tokens: u32,
    pub cache_ttl_minutes: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            completion_api_key: require_env("PERPLEXITY_API_KEY")?,
            completion_model: std::env::var("COMPLETION_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            completion_base_url: std::env::var("COMPLETION_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            completion_max_tokens: std::env::var("COMPLETION_MAX_TOKENS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse::<u32>()
                .context("COMPLETION_MAX_TOKENS must be a positive integer")?,
            cache_ttl_minutes: std::env::var("CACHE_TTL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<i64>()
                .context("CACHE_TTL_MINUTES must be a positive integer")?,
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

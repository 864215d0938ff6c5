use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default, so a bare `cargo run` talks to a local Ollama.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ollama_url: String,
    pub model_timeout: Duration,
    /// Attempts per model call for transport failures. 1 = no retry.
    pub model_max_attempts: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let model_max_attempts = parse_env("MODEL_MAX_ATTEMPTS", 1u32)?;
        if model_max_attempts == 0 {
            bail!("MODEL_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            port: parse_env("PORT", 5000u16)?,
            ollama_url: std::env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model_timeout: Duration::from_secs(parse_env("MODEL_TIMEOUT_SECS", 60u64)?),
            model_max_attempts,
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PAGE_CHAR_LIMIT: usize = 14_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Runtime settings for the collaborators around the parser.
///
/// Resolved once in `main` and passed down; nothing reads the environment
/// after that.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub page_char_limit: usize,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Defaults, then the legacy `GOOGLE_API_KEY` / `GEMINI_MODEL`, then `PORTFOLIO_*`.
    pub fn load() -> Result<Self> {
        let legacy_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
        let legacy_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Config::builder()
            .set_default("api_key", legacy_key)?
            .set_default("gemini_model", legacy_model)?
            .set_default("gemini_endpoint", DEFAULT_ENDPOINT)?
            .set_default("page_char_limit", DEFAULT_PAGE_CHAR_LIMIT as u64)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .add_source(Environment::with_prefix("PORTFOLIO").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: String::new(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_endpoint: DEFAULT_ENDPOINT.to_string(),
            page_char_limit: DEFAULT_PAGE_CHAR_LIMIT,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

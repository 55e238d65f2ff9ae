//! Relay configuration, read from the process environment once at startup
//! and passed into the handlers as a value.

/// Model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Base URL of the generative-language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// API key for the model provider. `None` is a misconfiguration that is
    /// logged at startup; the first outbound call then fails upstream.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Value of the `Access-Control-Allow-Origin` header on every response.
    pub allowed_origin: String,
}

impl RelayConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_API_URL` and
    /// `ALLOWED_ORIGIN`, falling back to defaults for everything but the key.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());

        if api_key.is_none() {
            tracing::error!("FATAL: GEMINI_API_KEY is not set; every upstream call will be rejected until it is configured");
        }

        Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            endpoint: std::env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            allowed_origin: normalize_origin(
                &std::env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            ),
        }
    }
}

/// Browsers compare `Origin` values without a trailing slash, so a configured
/// `https://shop.example/` would never match any real request. Trim one
/// trailing slash; the wildcard is left alone.
#[must_use]
pub fn normalize_origin(origin: &str) -> String {
    if origin == "*" {
        return origin.to_string();
    }
    origin.strip_suffix('/').unwrap_or(origin).to_string()
}

//! API Configuration Module
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding, the completion provider, and CORS.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host for the HTTP listener.
    pub bind_host: String,

    /// Bind port for the HTTP listener.
    pub port: u16,

    /// OpenAI API key. When absent, no completion provider is registered
    /// and the chat endpoint answers 503.
    pub openai_api_key: Option<String>,

    /// Override for OpenAI-compatible gateways.
    pub openai_base_url: Option<String>,

    /// Configured model id, or "auto" for catalog-based selection.
    pub model_id: String,

    /// Outbound request budget for the completion provider.
    pub requests_per_minute: u32,

    /// Seconds before a cached "auto" model choice is re-resolved.
    pub model_cache_ttl_secs: u64,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            openai_api_key: None,
            openai_base_url: None,
            model_id: "auto".to_string(),
            requests_per_minute: 60,
            model_cache_ttl_secs: 3600,
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `LEGION_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `LEGION_API_PORT`: Bind port (default: 3000)
    /// - `OPENAI_API_KEY`: Completion provider credential
    /// - `OPENAI_BASE_URL`: OpenAI-compatible gateway override
    /// - `LEGION_MODEL_ID`: Model id or "auto" (default: auto)
    /// - `LEGION_OPENAI_RPM`: Outbound requests per minute (default: 60)
    /// - `LEGION_MODEL_CACHE_TTL_SECS`: Model choice cache TTL (default: 3600)
    /// - `LEGION_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("LEGION_API_BIND").unwrap_or(defaults.bind_host);
        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("LEGION_API_PORT").ok())
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let model_id =
            std::env::var("LEGION_MODEL_ID").unwrap_or(defaults.model_id);
        let requests_per_minute = std::env::var("LEGION_OPENAI_RPM")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.requests_per_minute);
        let model_cache_ttl_secs = std::env::var("LEGION_MODEL_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.model_cache_ttl_secs);
        let cors_origins = std::env::var("LEGION_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_host,
            port,
            openai_api_key,
            openai_base_url,
            model_id,
            requests_per_minute,
            model_cache_ttl_secs,
            cors_origins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.model_id, "auto");
        assert!(config.openai_api_key.is_none());
        assert!(config.cors_origins.is_empty());
    }
}

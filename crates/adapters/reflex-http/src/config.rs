use serde::Deserialize;

/// Configuration for the native results-service transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpServiceConfig {
    /// Origin the finish path is resolved against, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 10,
            user_agent: "reflex-http/0.1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: HttpServiceConfig = toml::from_str(r#"base_url = "http://game.test""#).unwrap();
        assert_eq!(config.base_url, "http://game.test");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.user_agent, "reflex-http/0.1");
    }
}

//! Client configuration.

/// Where the backend lives and how the session is persisted and routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://127.0.0.1:3000/api`. Never ends with `/`.
    pub base_url: String,
    /// Storage key the session token is persisted under.
    pub token_key: String,
    pub login_path: String,
    pub home_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            token_key: "token".to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `WAREHOUSE_API_URL` and `WAREHOUSE_TOKEN_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup("WAREHOUSE_API_URL") {
            Some(url) if !url.is_empty() => Self::new(&url),
            _ => Self::default(),
        };
        if let Some(key) = lookup("WAREHOUSE_TOKEN_KEY").filter(|k| !k.is_empty()) {
            config.token_key = key;
        }
        config
    }
}

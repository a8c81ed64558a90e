use std::env;

use estate_agents::CompletionConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0:8001";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://real_estate.db";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub database_url: String,
    pub allowed_origin: String,
    pub completion: CompletionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            completion: CompletionConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();

        Self {
            bind: read("ESTATE_BIND").unwrap_or(defaults.bind),
            database_url: read("ESTATE_DATABASE_URL").unwrap_or(defaults.database_url),
            allowed_origin: read("ESTATE_ALLOWED_ORIGIN")
                .map(|origin| origin.trim_end_matches('/').to_string())
                .unwrap_or(defaults.allowed_origin),
            completion: CompletionConfig::from_lookup(&lookup),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::cache::TtlConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    /// Directory of static frontend files to serve, if any.
    #[serde(default)]
    pub appdir: Option<String>,
    /// Directory for the on-disk response cache. Without one the cache
    /// lives in memory and dies with the process.
    #[serde(default)]
    pub cachedir: Option<String>,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub streaming: Option<StreamingConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_streaming_base_url")]
    pub base_url: String,
}

/// Per-category cache TTLs in seconds. Discovery and search results
/// go stale fast; details, genres and availability barely move.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_short_ttl")]
    pub recommendations_ttl_secs: u64,
    #[serde(default = "default_short_ttl")]
    pub search_ttl_secs: u64,
    #[serde(default = "default_long_ttl")]
    pub details_ttl_secs: u64,
    #[serde(default = "default_long_ttl")]
    pub genres_ttl_secs: u64,
    #[serde(default = "default_long_ttl")]
    pub availability_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recommendations_ttl_secs: default_short_ttl(),
            search_ttl_secs: default_short_ttl(),
            details_ttl_secs: default_long_ttl(),
            genres_ttl_secs: default_long_ttl(),
            availability_ttl_secs: default_long_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_config(&self) -> TtlConfig {
        TtlConfig {
            recommendations: chrono::Duration::seconds(self.recommendations_ttl_secs as i64),
            search: chrono::Duration::seconds(self.search_ttl_secs as i64),
            details: chrono::Duration::seconds(self.details_ttl_secs as i64),
            genres: chrono::Duration::seconds(self.genres_ttl_secs as i64),
            availability: chrono::Duration::seconds(self.availability_ttl_secs as i64),
        }
    }
}

fn default_port() -> String {
    "3001".to_string()
}

fn default_tmdb_base_url() -> String {
    crate::tmdb::DEFAULT_BASE_URL.to_string()
}

fn default_streaming_base_url() -> String {
    crate::streaming::DEFAULT_BASE_URL.to_string()
}

fn default_short_ttl() -> u64 {
    300
}

fn default_long_ttl() -> u64 {
    86400
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        Ok(config)
    }

    /// TMDB API key from the config file, or the environment.
    pub fn tmdb_api_key(&self) -> Option<String> {
        self.tmdb
            .api_key
            .clone()
            .or_else(|| std::env::var("TMDB_API_KEY").ok())
    }

    /// Streaming API key, present only when the streaming section is
    /// configured.
    pub fn streaming_api_key(&self) -> Option<String> {
        let streaming = self.streaming.as_ref()?;
        streaming
            .api_key
            .clone()
            .or_else(|| std::env::var("STREAMING_API_KEY").ok())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("TMDB API key not configured (set tmdb.api_key or TMDB_API_KEY)")]
    MissingTmdbKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = serde_yaml::from_str("tmdb:\n  api_key: abc\n").unwrap();

        assert_eq!(config.listen.port, "3001");
        assert_eq!(config.tmdb.base_url, crate::tmdb::DEFAULT_BASE_URL);
        assert_eq!(config.cache.recommendations_ttl_secs, 300);
        assert_eq!(config.cache.details_ttl_secs, 86400);
        assert!(config.streaming.is_none());
        assert_eq!(config.tmdb_api_key().as_deref(), Some("abc"));
    }

    #[test]
    fn test_cache_ttl_overrides() {
        let config: Config = serde_yaml::from_str(
            "cache:\n  recommendations_ttl_secs: 60\n  genres_ttl_secs: 120\n",
        )
        .unwrap();

        let ttl = config.cache.ttl_config();
        assert_eq!(ttl.recommendations, chrono::Duration::seconds(60));
        assert_eq!(ttl.genres, chrono::Duration::seconds(120));
        assert_eq!(ttl.search, chrono::Duration::seconds(300));
    }

    #[test]
    fn test_streaming_section_defaults() {
        let config: Config =
            serde_yaml::from_str("streaming:\n  api_key: xyz\n").unwrap();
        let streaming = config.streaming.as_ref().unwrap();
        assert_eq!(streaming.base_url, crate::streaming::DEFAULT_BASE_URL);
        assert_eq!(config.streaming_api_key().as_deref(), Some("xyz"));
    }
}

pub mod api;
pub mod cache;
pub mod config;
pub mod middleware;
pub mod movies;
pub mod prefs;
pub mod server;
pub mod streaming;
pub mod tmdb;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use cache::{DiskStore, KvStore, MemoryStore, ResponseCache};
use movies::MovieService;
use prefs::PrefsStore;
use streaming::StreamingClient;
use tmdb::TmdbClient;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str) -> Result<(), ServerError> {
    let config = config::Config::from_file(config_path)?;

    info!("Using config file: {}", config_path);

    let api_key = config
        .tmdb_api_key()
        .ok_or(config::ConfigError::MissingTmdbKey)?;

    let store: Arc<dyn KvStore> = match config.cachedir {
        Some(ref dir) => {
            info!("Caching responses under {}", dir);
            Arc::new(
                DiskStore::new(dir)
                    .map_err(|e| ServerError::Server(format!("Failed to open cache dir: {}", e)))?,
            )
        }
        None => {
            info!("No cache directory configured, caching in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let response_cache = ResponseCache::new(store.clone(), config.cache.ttl_config());

    let http = upstream::build_client(UPSTREAM_TIMEOUT)
        .map_err(|e| ServerError::Server(format!("Failed to build HTTP client: {}", e)))?;

    let tmdb = TmdbClient::new(http.clone(), config.tmdb.base_url.clone(), api_key);

    let streaming = match (&config.streaming, config.streaming_api_key()) {
        (Some(streaming_config), Some(key)) => {
            info!("Streaming availability lookups enabled");
            Some(StreamingClient::new(
                http,
                streaming_config.base_url.clone(),
                key,
            ))
        }
        _ => None,
    };

    let movies = Arc::new(MovieService::new(tmdb, streaming, response_cache));
    let prefs = Arc::new(PrefsStore::new(store));

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let has_tls = config.listen.tlscert.is_some() && config.listen.tlskey.is_some();

    let state = server::AppState::new(config.clone(), movies, prefs);
    let app = server::build_router(state);

    if has_tls {
        let cert_path = config.listen.tlscert.as_ref().unwrap();
        let key_path = config.listen.tlskey.as_ref().unwrap();

        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}

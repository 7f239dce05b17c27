use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::movies::MovieService;
use crate::prefs::PrefsStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: Arc<MovieService>,
    pub prefs: Arc<PrefsStore>,
}

impl AppState {
    pub fn new(config: Config, movies: Arc<MovieService>, prefs: Arc<PrefsStore>) -> Self {
        Self {
            config: Arc::new(config),
            movies,
            prefs,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(crate::api::health))
        .route("/api/recommendations", get(crate::api::get_recommendations))
        .route("/api/movie/:id", get(crate::api::get_movie))
        .route(
            "/api/movie/:id/availability",
            get(crate::api::get_movie_availability),
        )
        .route("/api/movies/search", get(crate::api::search_movies))
        .route("/api/genres", get(crate::api::get_genres))
        .route(
            "/api/preferences",
            get(crate::api::get_preferences).put(crate::api::put_preferences),
        )
        .route("/api/cache", delete(crate::api::clear_cache));

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::normalize_path))
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    // CORS preflight for unrouted paths still gets a 200.
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

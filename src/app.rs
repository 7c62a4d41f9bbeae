use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::docs;
use crate::errors::AppError;
use crate::gate::{route_gate, RouteTable};
use crate::jwt::JwtConfig;
use crate::routes::{health, session};

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub routes: Arc<RouteTable>,
    pub cookie_name: Arc<str>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            jwt: Arc::new(config.jwt),
            routes: Arc::new(config.routes),
            cookie_name: Arc::from(config.cookie_name),
            static_dir: Arc::new(config.static_dir),
        }
    }
}

pub fn create_app(config: AppConfig) -> Result<Router, AppError> {
    let openapi = docs::build_openapi(config.port)?;
    let state = AppState::new(config);

    tracing::info!(
        prefixes = state.routes.len(),
        static_dir = %state.static_dir.display(),
        "route gate configured"
    );

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    // Not gated: JSON callers get 401s, not redirects.
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/session", get(session::current_session))
        .route("/gate/decision", get(session::decision));

    // Every page path serves index.html once the gate lets it through.
    let index = state.static_dir.join("index.html");
    let spa = ServeDir::new(state.static_dir.as_path()).fallback(ServeFile::new(index));
    let pages = Router::new()
        .fallback_service(spa)
        .layer(middleware::from_fn_with_state(state.clone(), route_gate));

    let router = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .merge(docs::swagger_routes(openapi))
        .merge(pages)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the SPA bundle's `index.html` is present.
    pub static_dir_ok: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let index = state.static_dir.join("index.html");
    let static_dir_ok = index.is_file();

    if !static_dir_ok {
        tracing::warn!(path = %index.display(), "SPA index.html missing");
    }

    Json(HealthResponse { status: "ok", static_dir_ok })
}

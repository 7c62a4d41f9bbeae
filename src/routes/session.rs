use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::gate::{evaluate, landing_page, routes::normalize_path};
use crate::jwt::{request_token, AuthClaim};
use crate::models::session::{DecisionQuery, DecisionResponse, SessionResponse};

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Gate",
    responses(
        (status = 200, description = "Decoded access token and landing page", body = SessionResponse),
        (status = 401, description = "Access token missing or invalid")
    )
)]
pub async fn current_session(AuthClaim(claim): AuthClaim) -> AppResult<Json<SessionResponse>> {
    let landing = landing_page(&claim).to_string();
    Ok(Json(SessionResponse { claim, landing }))
}

#[utoipa::path(
    get,
    path = "/api/gate/decision",
    tag = "Gate",
    params(DecisionQuery),
    responses(
        (status = 200, description = "Gate decision for the caller on the given path", body = DecisionResponse),
        (status = 400, description = "Path does not start with '/'")
    )
)]
pub async fn decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DecisionQuery>,
) -> AppResult<Json<DecisionResponse>> {
    if !query.path.starts_with('/') {
        return Err(AppError::bad_request("path must start with '/'"));
    }

    let claim = state.jwt.claim_state(request_token(&headers, &state.cookie_name));
    let path = normalize_path(&query.path);
    let category = state.routes.classify(&path);
    let decision = evaluate(&state.routes, &path, &claim);

    Ok(Json(DecisionResponse::new(path, category, &decision)))
}

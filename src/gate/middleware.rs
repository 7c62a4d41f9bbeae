use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect as RedirectResponse, Response};

use super::policy::{evaluate, Decision, Redirect};
use super::ClaimState;
use crate::app::AppState;
use crate::jwt::cookie_value;

/// Page-router middleware: evaluates the gate before the SPA bundle is served.
pub async fn route_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.routes.is_asset(request.uri().path()) {
        return next.run(request).await;
    }

    let claim = state
        .jwt
        .claim_state(cookie_value(request.headers(), &state.cookie_name));

    match evaluate(&state.routes, request.uri().path(), &claim) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => redirect(&target, &claim, &state.cookie_name),
    }
}

fn redirect(target: &Redirect, claim: &ClaimState, cookie_name: &str) -> Response {
    let mut response = RedirectResponse::temporary(&target.location()).into_response();

    // stop the browser from replaying a cookie that will never verify
    if *claim == ClaimState::Malformed {
        let expired = format!("{cookie_name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&expired) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

#![allow(dead_code)]

use std::fs;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use estate_gate::jwt::JwtConfig;
use estate_gate::models::claim::{IdentityClaim, VerificationStatus};
use estate_gate::{create_app, AppConfig};

pub const SECRET: &str = "test-secret";
pub const INDEX_HTML: &str = "<!doctype html><div id=\"root\"></div>";

/// Router over a throwaway SPA bundle. Keep the `TempDir` alive for the test.
pub fn test_app() -> Result<(Router, TempDir)> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("index.html"), INDEX_HTML)?;
    fs::create_dir_all(dir.path().join("assets"))?;
    fs::write(dir.path().join("assets").join("app.js"), "console.log('app')")?;

    let config = AppConfig::new(JwtConfig::new(SECRET)).with_static_dir(dir.path());
    let app = create_app(config)?;
    Ok((app, dir))
}

pub fn admin_token() -> Result<String> {
    Ok(JwtConfig::new(SECRET).encode(&IdentityClaim::admin())?)
}

pub fn owner_token(status: VerificationStatus) -> Result<String> {
    Ok(JwtConfig::new(SECRET).encode(&IdentityClaim::owner(status))?)
}

/// Token signed with the test secret over an arbitrary payload, the way an
/// external issuer would produce it.
pub fn raw_token(payload: Value) -> Result<String> {
    Ok(jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &payload,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )?)
}

pub fn in_one_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Result<Response> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("cookie", format!("theme=dark; accessToken={}", token));
    }
    let req = builder.body(Body::empty())?;
    Ok(app.clone().oneshot(req).await?)
}

pub fn location(resp: &Response) -> Option<&str> {
    resp.headers().get("location").and_then(|v| v.to_str().ok())
}

pub fn assert_redirect(resp: &Response, expected: &str) {
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "expected redirect to {}", expected);
    assert_eq!(location(resp), Some(expected));
}

/// Follow the redirect once with the same cookie and require the target to render.
pub async fn assert_redirect_lands(app: &Router, resp: &Response, token: Option<&str>) -> Result<()> {
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let target = location(resp).unwrap_or_default().to_string();
    let next = get(app, &target, token).await?;
    assert_eq!(next.status(), StatusCode::OK, "redirect target {} did not render", target);
    Ok(())
}

pub async fn json_body(resp: Response) -> Result<Value> {
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&body_bytes)?)
}

pub async fn text_body(resp: Response) -> Result<String> {
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(String::from_utf8_lossy(&body_bytes).into_owned())
}

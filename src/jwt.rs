use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use crate::app::AppState;
use crate::errors::{AppError, ClaimDecodeError};
use crate::gate::ClaimState;
use crate::models::claim::{IdentityClaim, Role, VerificationStatus};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours: 24,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            exp_hours,
        })
    }

    /// Sign an access token. Production tokens come from the auth service;
    /// this is used by the CLI and tests.
    pub fn encode(&self, identity: &IdentityClaim) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let claims = Claims {
            sub: identity.sub.clone(),
            role: identity.role,
            verification_status: identity.verification_status,
            exp: exp.timestamp() as usize,
            iat: Some(now.timestamp() as usize),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<IdentityClaim, ClaimDecodeError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims.into_identity())
            .map_err(|err| ClaimDecodeError(err.to_string()))
    }

    /// Resolve the gate input for an optional raw token. Decode failures are
    /// logged and reported as [`ClaimState::Malformed`], never as an error.
    pub fn claim_state(&self, token: Option<&str>) -> ClaimState {
        let Some(token) = token else {
            return ClaimState::Absent;
        };

        match self.decode(token) {
            Ok(claim) => {
                tracing::debug!(
                    role = claim.role.as_str(),
                    status = claim.effective_status().as_str(),
                    "access token verified"
                );
                ClaimState::Present(claim)
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejecting access token");
                ClaimState::Malformed
            }
        }
    }
}

/// Token payload as issued by the authentication service.
///
/// Routing needs `role` (and `verificationStatus` for owners); `exp` is
/// required because expiry is validated. `sub` is kept in whatever format the
/// issuer uses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

impl Claims {
    pub fn into_identity(self) -> IdentityClaim {
        IdentityClaim {
            sub: self.sub,
            role: self.role,
            verification_status: self.verification_status,
        }
    }
}

/// Value of the named cookie, if set and non-empty.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Cookie first, then `Authorization: Bearer` for API callers.
pub fn request_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    })
}

/// Signed-in identity for API handlers. Unlike the page gate, a missing or
/// invalid token is rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthClaim(pub IdentityClaim);

#[async_trait]
impl FromRequestParts<AppState> for AuthClaim {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers, &state.cookie_name)
            .ok_or_else(|| AppError::unauthorized("access token missing"))?;

        let claim = state.jwt.decode(token)?;

        Ok(AuthClaim(claim))
    }
}

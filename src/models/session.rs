use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::gate::{Decision, RouteCategory};
use crate::models::claim::IdentityClaim;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub claim: IdentityClaim,
    /// Page the client should land on after sign-in.
    #[schema(example = "/pending-approval")]
    pub landing: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DecisionQuery {
    /// Page path to evaluate, e.g. `/units/12`.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Allow,
    Redirect,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecisionResponse {
    #[schema(example = "/units")]
    pub path: String,
    pub category: RouteCategory,
    pub decision: DecisionKind,
    #[schema(example = "/login?from=%2Funits")]
    pub location: Option<String>,
}

impl DecisionResponse {
    pub fn new(path: String, category: RouteCategory, decision: &Decision) -> Self {
        let kind = match decision {
            Decision::Allow => DecisionKind::Allow,
            Decision::Redirect(_) => DecisionKind::Redirect,
        };

        Self {
            path,
            category,
            decision: kind,
            location: decision.location(),
        }
    }
}

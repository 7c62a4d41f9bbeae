//! Route access gate
//!
//! Decides, per page navigation, whether the request may render or must be
//! redirected. Inputs are the request path and the identity decoded from the
//! access-token cookie; the route table is built once at startup.

mod middleware;
pub mod policy;
pub mod routes;

pub use middleware::route_gate;
pub use policy::{evaluate, landing_page, Decision, Redirect};
pub use routes::{paths, RouteCategory, RouteTable};

use crate::models::claim::IdentityClaim;

/// What the access-token cookie yielded for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    /// No cookie.
    Absent,
    /// Cookie present but it failed verification.
    Malformed,
    Present(IdentityClaim),
}

impl ClaimState {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimState::Absent => "anonymous",
            ClaimState::Malformed => "malformed",
            ClaimState::Present(claim) if claim.is_admin() => "admin",
            ClaimState::Present(_) => "owner",
        }
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OWNER" => Ok(Role::Owner),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Owner identity verification state.
///
/// Transitions happen in the backend (document upload, admin review); the gate
/// only reads the value. Anything the backend sends that is not one of the
/// known states deserializes to `Unrecognized` and is routed like
/// `PendingDocuments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    NotRequired,
    PendingDocuments,
    PendingApproval,
    Approved,
    Rejected,
    #[serde(other)]
    Unrecognized,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 6] = [
        VerificationStatus::NotRequired,
        VerificationStatus::PendingDocuments,
        VerificationStatus::PendingApproval,
        VerificationStatus::Approved,
        VerificationStatus::Rejected,
        VerificationStatus::Unrecognized,
    ];

    /// Full access granted; the verification pages are no longer reachable.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Approved | VerificationStatus::NotRequired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::NotRequired => "NOT_REQUIRED",
            VerificationStatus::PendingDocuments => "PENDING_DOCUMENTS",
            VerificationStatus::PendingApproval => "PENDING_APPROVAL",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
            VerificationStatus::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "NOT_REQUIRED" => Ok(VerificationStatus::NotRequired),
            "PENDING_DOCUMENTS" => Ok(VerificationStatus::PendingDocuments),
            "PENDING_APPROVAL" => Ok(VerificationStatus::PendingApproval),
            "APPROVED" => Ok(VerificationStatus::Approved),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            other => Err(format!("unknown verification status: {other}")),
        }
    }
}

/// Identity decoded from the `accessToken` cookie.
///
/// Only `role` is required on the wire; the subject is carried for logging and
/// the session endpoint, in whatever format the auth service issues it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub role: Role,
    /// Only meaningful for owners. An owner token without it is routed as unverified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
}

impl IdentityClaim {
    pub fn admin() -> Self {
        Self {
            sub: None,
            role: Role::Admin,
            verification_status: None,
        }
    }

    pub fn owner(status: VerificationStatus) -> Self {
        Self {
            sub: None,
            role: Role::Owner,
            verification_status: Some(status),
        }
    }

    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Status used for routing. Admins are always fully verified; an owner
    /// without a status fails closed.
    pub fn effective_status(&self) -> VerificationStatus {
        match self.role {
            Role::Admin => VerificationStatus::NotRequired,
            Role::Owner => self
                .verification_status
                .unwrap_or(VerificationStatus::Unrecognized),
        }
    }
}

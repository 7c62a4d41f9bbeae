use url::form_urlencoded;

use super::routes::{normalize_path, paths, RouteCategory, RouteTable};
use super::ClaimState;
use crate::models::claim::{IdentityClaim, Role, VerificationStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Redirect),
}

impl Decision {
    fn to(path: &'static str) -> Self {
        Decision::Redirect(Redirect { path, from: None })
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::Redirect(redirect) => Some(redirect.location()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target page, always one of the constants in [`paths`].
    pub path: &'static str,
    /// Originally requested path, only set for login redirects.
    pub from: Option<String>,
}

impl Redirect {
    /// `Location` header value, e.g. `/login?from=%2Funits`.
    pub fn location(&self) -> String {
        match &self.from {
            Some(from) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("from", from)
                    .finish();
                format!("{}?{}", self.path, query)
            }
            None => self.path.to_string(),
        }
    }
}

/// Where a signed-in user belongs when they hit `/`, `/login` or `/register`.
pub fn landing_page(claim: &IdentityClaim) -> &'static str {
    match claim.role {
        Role::Admin => paths::DASHBOARD,
        Role::Owner => match claim.effective_status() {
            VerificationStatus::Approved | VerificationStatus::NotRequired => paths::DASHBOARD,
            status => verification_page(status),
        },
    }
}

/// Verification page an unverified owner is pinned to.
fn verification_page(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::PendingApproval => paths::PENDING_APPROVAL,
        VerificationStatus::PendingDocuments | VerificationStatus::Rejected => paths::VERIFY_DOCUMENTS,
        VerificationStatus::Unrecognized => {
            tracing::warn!("unrecognized verification status, routing to document upload");
            paths::VERIFY_DOCUMENTS
        }
        VerificationStatus::Approved | VerificationStatus::NotRequired => paths::DASHBOARD,
    }
}

/// Decide whether a page navigation may proceed.
///
/// Rules are evaluated in order and the first match wins:
/// 1. no claim on a protected or admin page -> `/login?from=<path>`
/// 2. undecodable cookie outside the public pages -> `/login`
/// 3. owners: verified owners leave the verification pages, unverified owners
///    are pinned to the page for their status
/// 4. signed in on `/login` or `/register` -> landing page
/// 5. admin-only page without the admin role -> `/dashboard`
/// 6. `/` -> landing page
/// 7. allow
pub fn evaluate(routes: &RouteTable, path: &str, claim: &ClaimState) -> Decision {
    let path = normalize_path(path);
    let category = routes.classify(&path);

    let decision = match claim {
        ClaimState::Absent => evaluate_anonymous(&path, category),
        ClaimState::Malformed => match category {
            RouteCategory::Public => Decision::Allow,
            _ => Decision::to(paths::LOGIN),
        },
        ClaimState::Present(claim) => evaluate_signed_in(&path, category, claim),
    };

    tracing::debug!(
        path = %path,
        category = category.as_str(),
        claim = claim.label(),
        decision = ?decision,
        "gate decision"
    );

    decision
}

fn evaluate_anonymous(path: &str, category: RouteCategory) -> Decision {
    match category {
        RouteCategory::Public | RouteCategory::VerificationFlow => Decision::Allow,
        // `/` sends anonymous visitors to a bare `/login`
        _ if path == paths::ROOT => Decision::to(paths::LOGIN),
        _ => Decision::Redirect(Redirect {
            path: paths::LOGIN,
            from: Some(path.to_string()),
        }),
    }
}

fn evaluate_signed_in(path: &str, category: RouteCategory, claim: &IdentityClaim) -> Decision {
    if claim.role == Role::Owner {
        let status = claim.effective_status();
        if status.is_verified() {
            if category == RouteCategory::VerificationFlow {
                return Decision::to(paths::DASHBOARD);
            }
        } else if category != RouteCategory::Public {
            let target = verification_page(status);
            if path != target {
                return Decision::to(target);
            }
        }
    }

    if path == paths::LOGIN || path == paths::REGISTER {
        return Decision::to(landing_page(claim));
    }

    if category == RouteCategory::AdminOnly && !claim.is_admin() {
        return Decision::to(paths::DASHBOARD);
    }

    if path == paths::ROOT {
        return Decision::to(landing_page(claim));
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every configured prefix, one level below it, and a spread of protected
    /// and non-canonical paths.
    fn sample_paths(routes: &RouteTable) -> Vec<String> {
        let mut paths: Vec<String> = routes
            .entries()
            .flat_map(|(prefix, _)| [prefix.to_string(), format!("{prefix}/1"), format!("{prefix}/")])
            .collect();
        paths.extend(
            [
                "/",
                "//",
                "/dashboard",
                "/units",
                "/units/12/handovers",
                "/handovers",
                "/snaggings",
                "/documents",
                "/requests",
                "/settings",
                "/usersettings",
                "//users",
                "/%75sers",
                "//audit-logs/1",
                "/units/../admin",
                "/./verify-documents",
                "/%2Fpending-approval",
            ]
            .map(str::to_string),
        );
        paths
    }

    fn owner(status: VerificationStatus) -> ClaimState {
        ClaimState::Present(IdentityClaim::owner(status))
    }

    fn admin() -> ClaimState {
        ClaimState::Present(IdentityClaim::admin())
    }

    fn all_claims() -> Vec<ClaimState> {
        let mut claims = vec![ClaimState::Absent, ClaimState::Malformed, admin()];
        claims.extend(VerificationStatus::ALL.into_iter().map(owner));
        claims
    }

    fn redirect(path: &'static str) -> Decision {
        Decision::to(path)
    }

    #[test]
    fn test_anonymous_protected_page_goes_to_login_with_origin() {
        let routes = RouteTable::default();
        let decision = evaluate(&routes, "/units", &ClaimState::Absent);

        assert_eq!(
            decision,
            Decision::Redirect(Redirect {
                path: paths::LOGIN,
                from: Some("/units".to_string())
            })
        );
        assert_eq!(decision.location().as_deref(), Some("/login?from=%2Funits"));
    }

    #[test]
    fn test_anonymous_root_goes_to_bare_login() {
        let routes = RouteTable::default();
        assert_eq!(evaluate(&routes, "/", &ClaimState::Absent), redirect(paths::LOGIN));
    }

    #[test]
    fn test_anonymous_public_and_verification_pages_allowed() {
        let routes = RouteTable::default();
        for path in ["/login", "/register/verify", "/privacy", "/verify-documents", "/pending-approval"] {
            assert!(evaluate(&routes, path, &ClaimState::Absent).is_allow(), "{path}");
        }
    }

    #[test]
    fn test_owner_scenarios() {
        let routes = RouteTable::default();

        assert_eq!(
            evaluate(&routes, "/verify-documents", &owner(VerificationStatus::PendingApproval)),
            redirect(paths::PENDING_APPROVAL)
        );
        assert!(evaluate(&routes, "/pending-approval", &owner(VerificationStatus::PendingApproval)).is_allow());
        assert!(evaluate(&routes, "/dashboard", &owner(VerificationStatus::Approved)).is_allow());
        assert_eq!(
            evaluate(&routes, "/users", &owner(VerificationStatus::Approved)),
            redirect(paths::DASHBOARD)
        );
    }

    #[test]
    fn test_verified_owner_leaves_verification_pages() {
        let routes = RouteTable::default();
        for status in [VerificationStatus::Approved, VerificationStatus::NotRequired] {
            assert_eq!(evaluate(&routes, "/verify-documents", &owner(status)), redirect(paths::DASHBOARD));
            assert_eq!(evaluate(&routes, "/pending-approval", &owner(status)), redirect(paths::DASHBOARD));
        }
    }

    #[test]
    fn test_rejected_owner_resubmits_documents() {
        let routes = RouteTable::default();
        let claim = owner(VerificationStatus::Rejected);

        assert_eq!(evaluate(&routes, "/units", &claim), redirect(paths::VERIFY_DOCUMENTS));
        assert_eq!(evaluate(&routes, "/pending-approval", &claim), redirect(paths::VERIFY_DOCUMENTS));
        assert!(evaluate(&routes, "/verify-documents", &claim).is_allow());
    }

    #[test]
    fn test_unverified_owner_may_read_public_pages() {
        let routes = RouteTable::default();
        let claim = owner(VerificationStatus::PendingDocuments);

        assert!(evaluate(&routes, "/terms", &claim).is_allow());
        assert!(evaluate(&routes, "/support", &claim).is_allow());
        assert_eq!(evaluate(&routes, "/login", &claim), redirect(paths::VERIFY_DOCUMENTS));
    }

    #[test]
    fn test_unknown_status_fails_closed() {
        let routes = RouteTable::default();
        let claim = owner(VerificationStatus::Unrecognized);
        assert_eq!(evaluate(&routes, "/dashboard", &claim), redirect(paths::VERIFY_DOCUMENTS));

        let missing = ClaimState::Present(IdentityClaim {
            sub: None,
            role: Role::Owner,
            verification_status: None,
        });
        assert_eq!(evaluate(&routes, "/dashboard", &missing), redirect(paths::VERIFY_DOCUMENTS));
    }

    #[test]
    fn test_admin_is_never_pinned_to_verification() {
        let routes = RouteTable::default();
        let claim = admin();

        for path in sample_paths(&routes) {
            let decision = evaluate(&routes, &path, &claim);
            match normalize_path(&path).as_str() {
                "/" | "/login" | "/register" => assert_eq!(decision, redirect(paths::DASHBOARD), "{path}"),
                _ => assert!(decision.is_allow(), "admin denied {path}: {decision:?}"),
            }
        }
    }

    #[test]
    fn test_signed_in_auth_pages_redirect_to_landing() {
        let routes = RouteTable::default();

        assert_eq!(evaluate(&routes, "/login", &admin()), redirect(paths::DASHBOARD));
        assert_eq!(evaluate(&routes, "/register/", &owner(VerificationStatus::Approved)), redirect(paths::DASHBOARD));
        assert_eq!(
            evaluate(&routes, "/register", &owner(VerificationStatus::PendingApproval)),
            redirect(paths::PENDING_APPROVAL)
        );
        assert_eq!(evaluate(&routes, "/", &owner(VerificationStatus::NotRequired)), redirect(paths::DASHBOARD));
    }

    #[test]
    fn test_malformed_cookie_degrades_to_login() {
        let routes = RouteTable::default();

        assert_eq!(evaluate(&routes, "/dashboard", &ClaimState::Malformed), redirect(paths::LOGIN));
        assert_eq!(evaluate(&routes, "/verify-documents", &ClaimState::Malformed), redirect(paths::LOGIN));
        assert!(evaluate(&routes, "/login", &ClaimState::Malformed).is_allow());
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let routes = RouteTable::default();
        for claim in all_claims() {
            for path in sample_paths(&routes) {
                assert_eq!(evaluate(&routes, &path, &claim), evaluate(&routes, &path, &claim));
            }
        }
    }

    #[test]
    fn test_redirect_targets_are_allowed() {
        let routes = RouteTable::default();
        for claim in all_claims() {
            for path in sample_paths(&routes) {
                if let Decision::Redirect(target) = evaluate(&routes, &path, &claim) {
                    let follow_up = evaluate(&routes, target.path, &claim);
                    assert!(
                        follow_up.is_allow(),
                        "{path} -> {} for {} then {follow_up:?}",
                        target.path,
                        claim.label()
                    );
                }
            }
        }
    }

    #[test]
    fn test_non_canonical_admin_paths_are_not_bypassed() {
        let routes = RouteTable::default();
        let claim = owner(VerificationStatus::Approved);

        for path in ["//users", "/%75sers", "//audit-logs/1", "/users//7", "/units/../admin", "/%2Fusers"] {
            assert_eq!(evaluate(&routes, path, &claim), redirect(paths::DASHBOARD), "{path}");
        }
        assert_eq!(evaluate(&routes, "//%76erify-documents", &claim), redirect(paths::DASHBOARD));
        assert_eq!(evaluate(&routes, "//login", &claim), redirect(paths::DASHBOARD));
    }

    #[test]
    fn test_login_origin_is_canonical() {
        let routes = RouteTable::default();
        assert_eq!(
            evaluate(&routes, "//units/./12/", &ClaimState::Absent).location().as_deref(),
            Some("/login?from=%2Funits%2F12")
        );
    }

    #[test]
    fn test_sample_paths_cover_every_prefix() {
        let routes = RouteTable::default();
        let samples = sample_paths(&routes);
        for (prefix, _) in routes.entries() {
            assert!(samples.iter().any(|path| path == prefix), "{prefix}");
        }
        for path in ["/reset-password", "/privacy", "/owner-verification/1"] {
            assert!(samples.iter().any(|sample| sample == path), "{path}");
        }
    }

    #[test]
    fn test_landing_page_per_status() {
        assert_eq!(landing_page(&IdentityClaim::admin()), paths::DASHBOARD);
        assert_eq!(landing_page(&IdentityClaim::owner(VerificationStatus::Approved)), paths::DASHBOARD);
        assert_eq!(landing_page(&IdentityClaim::owner(VerificationStatus::NotRequired)), paths::DASHBOARD);
        assert_eq!(
            landing_page(&IdentityClaim::owner(VerificationStatus::PendingDocuments)),
            paths::VERIFY_DOCUMENTS
        );
        assert_eq!(
            landing_page(&IdentityClaim::owner(VerificationStatus::PendingApproval)),
            paths::PENDING_APPROVAL
        );
        assert_eq!(landing_page(&IdentityClaim::owner(VerificationStatus::Rejected)), paths::VERIFY_DOCUMENTS);
    }
}

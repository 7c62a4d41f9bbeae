use percent_encoding::percent_decode_str;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

/// Page paths the gate redirects to or compares against.
pub mod paths {
    pub const ROOT: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const DASHBOARD: &str = "/dashboard";
    pub const VERIFY_DOCUMENTS: &str = "/verify-documents";
    pub const PENDING_APPROVAL: &str = "/pending-approval";
}

pub const PUBLIC_ROUTES: &[&str] = &[
    "/login",
    "/register",
    "/register/verify",
    "/verify-otp",
    "/forgot-password",
    "/reset-password",
    "/terms",
    "/privacy",
    "/support",
];

pub const VERIFICATION_ROUTES: &[&str] = &[paths::VERIFY_DOCUMENTS, paths::PENDING_APPROVAL];

pub const ADMIN_ROUTES: &[&str] = &[
    "/users",
    "/admin",
    "/settings/admin",
    "/audit-logs",
    "/owner-verification",
];

/// Requests under these prefixes never reach the gate (bundle assets, icons).
pub const ASSET_PREFIXES: &[&str] = &["/assets", "/static", "/_next", "/favicon.ico", "/robots.txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    Public,
    VerificationFlow,
    AdminOnly,
    /// Anything no prefix claims.
    Protected,
}

impl RouteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteCategory::Public => "public",
            RouteCategory::VerificationFlow => "verification_flow",
            RouteCategory::AdminOnly => "admin_only",
            RouteCategory::Protected => "protected",
        }
    }
}

/// Immutable prefix classification, built once at startup and shared.
///
/// Entries are kept sorted by descending prefix length so the first match is
/// the longest one (`/settings/admin` wins over a hypothetical `/settings`).
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(String, RouteCategory)>,
    assets: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            assets: ASSET_PREFIXES.iter().map(|p| p.to_string()).collect(),
        };
        for (prefixes, category) in [
            (PUBLIC_ROUTES, RouteCategory::Public),
            (VERIFICATION_ROUTES, RouteCategory::VerificationFlow),
            (ADMIN_ROUTES, RouteCategory::AdminOnly),
        ] {
            table
                .entries
                .extend(prefixes.iter().map(|p| (p.to_string(), category)));
        }
        table.sort();
        table
    }
}

impl RouteTable {
    /// Build a table from explicit prefix lists.
    ///
    /// Fails when a prefix does not start with `/`, or when the same prefix is
    /// assigned to two categories.
    pub fn new<S: AsRef<str>>(public: &[S], verification: &[S], admin: &[S]) -> Result<Self, AppError> {
        let mut entries: Vec<(String, RouteCategory)> = Vec::new();

        for (prefixes, category) in [
            (public, RouteCategory::Public),
            (verification, RouteCategory::VerificationFlow),
            (admin, RouteCategory::AdminOnly),
        ] {
            for raw in prefixes {
                let prefix = validate_prefix(raw.as_ref())?;
                match entries.iter().find(|(existing, _)| *existing == prefix) {
                    Some((_, existing)) if *existing == category => continue,
                    Some((_, existing)) => {
                        return Err(AppError::configuration(format!(
                            "route prefix {prefix} is both {} and {}",
                            existing.as_str(),
                            category.as_str()
                        )));
                    }
                    None => entries.push((prefix, category)),
                }
            }
        }

        let mut table = Self {
            entries,
            assets: ASSET_PREFIXES.iter().map(|p| p.to_string()).collect(),
        };
        table.sort();
        Ok(table)
    }

    /// Default lists with extra public and admin-only prefixes appended.
    pub fn with_extras<S: AsRef<str>>(extra_public: &[S], extra_admin: &[S]) -> Result<Self, AppError> {
        let public: Vec<String> = PUBLIC_ROUTES
            .iter()
            .map(|p| p.to_string())
            .chain(extra_public.iter().map(|p| p.as_ref().to_string()))
            .collect();
        let admin: Vec<String> = ADMIN_ROUTES
            .iter()
            .map(|p| p.to_string())
            .chain(extra_admin.iter().map(|p| p.as_ref().to_string()))
            .collect();
        let verification: Vec<String> = VERIFICATION_ROUTES.iter().map(|p| p.to_string()).collect();

        Self::new(&public, &verification, &admin)
    }

    pub fn with_asset_prefixes<S: AsRef<str>>(mut self, prefixes: &[S]) -> Result<Self, AppError> {
        self.assets = prefixes
            .iter()
            .map(|p| validate_prefix(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        let path = normalize_path(path);
        self.entries
            .iter()
            .find(|(prefix, _)| prefix_matches(prefix, &path))
            .map(|(_, category)| *category)
            .unwrap_or(RouteCategory::Protected)
    }

    pub fn is_asset(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.assets.iter().any(|prefix| prefix_matches(prefix, &path))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, RouteCategory)> {
        self.entries.iter().map(|(prefix, category)| (prefix.as_str(), *category))
    }

    pub fn asset_prefixes(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }
}

/// Canonical form of a request path, the way the file server and the SPA
/// router will resolve it: percent-decoded once, empty and `.` segments
/// dropped, `..` applied, no trailing slash. `//users/./%61dmin/` is
/// `/users/admin`; the root stays `/`.
pub fn normalize_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    if segments.is_empty() {
        paths::ROOT.to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Segment-aware prefix test: `/users` matches `/users/42`, not `/usersettings`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn validate_prefix(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(AppError::configuration(format!(
            "route prefix must start with '/': {trimmed:?}"
        )));
    }
    let normalized = normalize_path(trimmed);
    if normalized == paths::ROOT {
        return Err(AppError::configuration("route prefix '/' would match every path"));
    }
    Ok(normalized)
}

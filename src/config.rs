use std::path::PathBuf;

use crate::errors::AppError;
use crate::gate::RouteTable;
use crate::jwt::JwtConfig;

pub const DEFAULT_COOKIE_NAME: &str = "accessToken";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_STATIC_DIR: &str = "dist";

/// Process configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub routes: RouteTable,
    pub cookie_name: String,
    /// SPA bundle; `index.html` in it answers every allowed page path.
    pub static_dir: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            routes: RouteTable::default(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn from_env() -> Result<Self, AppError> {
        let jwt = JwtConfig::from_env()?;

        let port = match std::env::var("APP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?,
            Err(_) => DEFAULT_PORT,
        };

        let cookie_name = std::env::var("ACCESS_TOKEN_COOKIE")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        if cookie_name.contains(|c: char| c == '=' || c == ';' || c.is_whitespace()) {
            return Err(AppError::configuration(format!(
                "ACCESS_TOKEN_COOKIE is not a valid cookie name: {cookie_name:?}"
            )));
        }

        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());

        let routes = routes_from_env()?;

        Ok(Self {
            jwt,
            routes,
            cookie_name,
            static_dir: PathBuf::from(static_dir),
            port,
        })
    }
}

/// Default route table plus `GATE_EXTRA_*_ROUTES` and `GATE_ASSET_PREFIXES`.
pub fn routes_from_env() -> Result<RouteTable, AppError> {
    let mut routes = RouteTable::with_extras(
        &list_var("GATE_EXTRA_PUBLIC_ROUTES"),
        &list_var("GATE_EXTRA_ADMIN_ROUTES"),
    )?;

    let assets = list_var("GATE_ASSET_PREFIXES");
    if !assets.is_empty() {
        routes = routes.with_asset_prefixes(&assets)?;
    }

    Ok(routes)
}

/// Comma separated environment list; unset means empty.
fn list_var(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|value| parse_list(&value))
        .unwrap_or_default()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

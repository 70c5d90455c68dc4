/*
 * Responsibility
 * - 環境変数から設定を読む (PORT, APP_ENV, DATABASE_URL, JWT_SECRET, CORS ...)
 * - 起動時に検証し、足りない/不正なら起動を止める
 *
 * Notes
 * - 読み取り元は関数として注入できる (テストは HashMap を渡す)
 */
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::services::auth::MIN_SECRET_BYTES;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_WEBSOCKET_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("production" | "prod") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    // checked on the /ws upgrade in production
    pub websocket_allowed_origins: Vec<String>,

    // None => in-memory directory (development only)
    pub database_url: Option<String>,

    // HMAC key shared by issuance and verification
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,

    pub request_timeout_seconds: u64,
    pub max_body_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // neither the secret nor the database url (may embed a password)
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("websocket_allowed_origins", &self.websocket_allowed_origins)
            .field("database_configured", &self.database_url.is_some())
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

/// Optional numeric setting: absent means `default`, present must parse and be > 0.
fn positive<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .filter(|v| *v > T::default())
            .ok_or(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let port = positive(&var, "PORT", DEFAULT_PORT)?;
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|raw| origin_list(&raw))
            .unwrap_or_default();

        let websocket_allowed_origins = var("WEBSOCKET_ALLOWED_ORIGINS")
            .or_else(|| var("CORS_ALLOWED_ORIGINS"))
            .map(|raw| origin_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_WEBSOCKET_ORIGIN.to_string()]);

        let database_url = var("DATABASE_URL");
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            websocket_allowed_origins,
            database_url,
            jwt_secret,
            access_token_ttl_seconds: positive(
                &var,
                "ACCESS_TOKEN_TTL_SECONDS",
                DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            )?,
            request_timeout_seconds: positive(
                &var,
                "REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?,
            max_body_bytes: positive(&var, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests(app_env: AppEnv) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_env,
            cors_allowed_origins: vec!["https://app.campus.edu".to_string()],
            websocket_allowed_origins: vec!["https://app.campus.edu".to_string()],
            database_url: None,
            jwt_secret: "test-secret-key-for-signing-tokens-0123".to_string(),
            access_token_ttl_seconds: 3600,
            request_timeout_seconds: 5,
            max_body_bytes: 16,
        }
    }
}

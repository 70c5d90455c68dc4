use axum::http::{HeaderMap, header};

use crate::config::Config;

/// Which browser origins may open `/ws`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelOrigins {
    /// Development: every origin is accepted.
    #[default]
    Any,
    /// Production: exact match against the configured list.
    List(Vec<String>),
}

impl ChannelOrigins {
    pub fn from_config(config: &Config) -> Self {
        let origins = &config.websocket_allowed_origins;
        if !config.app_env.is_production() || origins.iter().any(|o| o == "*") {
            return Self::Any;
        }
        Self::List(origins.clone())
    }

    /// Requests without an `Origin` header do not come from a browser page
    /// and are accepted.
    pub fn allows(&self, headers: &HeaderMap) -> bool {
        let Some(origin) = headers.get(header::ORIGIN) else {
            return true;
        };
        match self {
            Self::Any => true,
            Self::List(list) => origin
                .to_str()
                .is_ok_and(|origin| list.iter().any(|allowed| allowed == origin)),
        }
    }
}

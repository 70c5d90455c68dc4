/// Factory: build `TokenCodec` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{TokenCodec, TokenError};

pub fn build_token_codec(config: &Config) -> Result<Arc<TokenCodec>, TokenError> {
    let codec = TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.access_token_ttl_seconds,
    )?;

    Ok(Arc::new(codec))
}

//! Channel handshake gate.
//!
//! Runs on every inbound frame but only acts on connect frames: the
//! `Authorization: Bearer <token>` header must be present and the token must
//! verify as `Valid`, otherwise the connection attempt is rejected. Unlike the
//! request gate there is no later checkpoint, so every failure is fatal here.

use std::sync::Arc;

use tracing::{info, warn};

use crate::services::auth::{
    AuthCtx, BearerError, BindOutcome, TokenCodec, Verification, parse_bearer,
};
use crate::ws::frame::Frame;
use crate::ws::session::ChannelSession;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Why a handshake was refused. Every variant terminates the connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("Missing Authorization header")]
    MissingCredential,
    #[error("Missing or invalid Authorization header")]
    MalformedCredential,
    #[error("Invalid or expired JWT token")]
    ExpiredCredential,
    #[error("Invalid or expired JWT token")]
    InvalidCredential,
    #[error("Channel is already bound to another identity")]
    IdentityConflict,
}

#[derive(Debug, Clone)]
pub struct HandshakeGate {
    tokens: Arc<TokenCodec>,
}

impl HandshakeGate {
    pub fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }

    /// Non-connect frames pass untouched, whatever headers they carry.
    pub fn inspect(&self, frame: &Frame, session: &ChannelSession) -> Result<(), HandshakeError> {
        if !frame.command.is_connect() {
            return Ok(());
        }

        let result = self.authenticate(frame).and_then(|ctx| {
            let subject = ctx.subject.clone();
            match session.bind(ctx) {
                BindOutcome::Bound => {
                    info!(session = %session.id(), subject = %subject, "channel authenticated");
                    Ok(())
                }
                BindOutcome::Unchanged => Ok(()),
                BindOutcome::Conflict => Err(HandshakeError::IdentityConflict),
            }
        });

        if let Err(err) = &result {
            warn!(session = %session.id(), error = %err, "channel handshake rejected");
        }
        result
    }

    fn authenticate(&self, frame: &Frame) -> Result<AuthCtx, HandshakeError> {
        let header = frame
            .header(AUTHORIZATION_HEADER)
            .ok_or(HandshakeError::MissingCredential)?;

        let token = parse_bearer(header).map_err(|err| match err {
            BearerError::Missing => HandshakeError::MissingCredential,
            BearerError::Scheme | BearerError::Empty => HandshakeError::MalformedCredential,
        })?;

        match self.tokens.verify(token) {
            Verification::Valid(claims) => Ok(AuthCtx::from(claims)),
            Verification::Expired(claims) => {
                warn!(subject = %claims.subject, expired_at = %claims.expires_at, "expired credential on channel connect");
                Err(HandshakeError::ExpiredCredential)
            }
            Verification::Invalid => Err(HandshakeError::InvalidCredential),
        }
    }
}

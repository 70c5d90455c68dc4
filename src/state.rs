/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 *   - token codec, credential lookup, permission resolver
 *   - channel handshake gate, broker registry, allowed /ws origins
 * - cheap to Clone (everything behind Arc)
 */
use std::sync::Arc;

use crate::repos::{CredentialStore, MembershipStore, TaskStore};
use crate::services::auth::TokenCodec;
use crate::services::permission::PermissionResolver;
use crate::ws::{Broker, ChannelOrigins, HandshakeGate};

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub users: Arc<dyn CredentialStore>,
    pub permissions: Arc<PermissionResolver>,
    pub handshake: Arc<HandshakeGate>,
    pub broker: Broker,
    pub channel_origins: Arc<ChannelOrigins>,
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenCodec>,
        users: Arc<dyn CredentialStore>,
        memberships: Arc<dyn MembershipStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        let permissions = Arc::new(PermissionResolver::new(memberships, tasks));
        let handshake = Arc::new(HandshakeGate::new(tokens.clone()));

        Self {
            tokens,
            users,
            permissions,
            handshake,
            broker: Broker::new(),
            channel_origins: Arc::new(ChannelOrigins::Any),
        }
    }

    pub fn with_channel_origins(mut self, origins: ChannelOrigins) -> Self {
        self.channel_origins = Arc::new(origins);
        self
    }
}

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::services::auth::{AuthCtx, BindOutcome, SecurityContext};
use crate::ws::frame::Frame;

/// State of one open channel.
///
/// The identity is bound once by the handshake gate and then reused by every
/// later frame on the same connection without re-verifying the token.
/// Subscriptions live in the broker entry created by that handshake.
#[derive(Debug)]
pub struct ChannelSession {
    id: Uuid,
    security: SecurityContext,
    // frames pushed by the broker for this socket
    outbox: mpsc::Sender<Frame>,
}

impl ChannelSession {
    pub fn new(outbox: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            security: SecurityContext::new(),
            outbox,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> Option<&AuthCtx> {
        self.security.identity()
    }

    pub fn is_established(&self) -> bool {
        self.security.is_bound()
    }

    pub(crate) fn bind(&self, ctx: AuthCtx) -> BindOutcome {
        self.security.bind(ctx)
    }

    pub(crate) fn outbox(&self) -> mpsc::Sender<Frame> {
        self.outbox.clone()
    }
}

/*
 * Responsibility
 * - AuthCtx: the identity bound to one request or one channel connection
 * - binding helpers that never overwrite an existing identity
 *
 * Notes
 * - There is no ambient/global "current user": the gate that verified the token
 *   binds AuthCtx into the request extensions or the ChannelSession, and
 *   downstream code receives it as a parameter.
 */
use std::sync::OnceLock;

use axum::http::Extensions;

use super::claims::{IdentityClaims, UserRole};

/// Verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub subject: String,
    pub role: UserRole,
}

impl AuthCtx {
    pub fn new(subject: impl Into<String>, role: UserRole) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

impl From<IdentityClaims> for AuthCtx {
    fn from(claims: IdentityClaims) -> Self {
        Self::new(claims.subject, claims.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    // Same identity was already bound; nothing changed.
    Unchanged,
    // A different identity is bound; the new one was dropped.
    Conflict,
}

/// Bind `ctx` into request extensions unless an identity is already there.
pub fn bind_request_identity(extensions: &mut Extensions, ctx: AuthCtx) -> BindOutcome {
    match extensions.get::<AuthCtx>() {
        Some(existing) if *existing == ctx => BindOutcome::Unchanged,
        Some(_) => BindOutcome::Conflict,
        None => {
            extensions.insert(ctx);
            BindOutcome::Bound
        }
    }
}

/// Write-once identity slot for a long-lived connection.
#[derive(Debug, Default)]
pub struct SecurityContext {
    identity: OnceLock<AuthCtx>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, ctx: AuthCtx) -> BindOutcome {
        match self.identity.set(ctx) {
            Ok(()) => BindOutcome::Bound,
            Err(rejected) => {
                if self.identity.get() == Some(&rejected) {
                    BindOutcome::Unchanged
                } else {
                    BindOutcome::Conflict
                }
            }
        }
    }

    pub fn identity(&self) -> Option<&AuthCtx> {
        self.identity.get()
    }

    pub fn is_bound(&self) -> bool {
        self.identity.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> AuthCtx {
        AuthCtx::new("ada@campus.edu", UserRole::Student)
    }

    #[test]
    fn request_binding_is_single() {
        let mut ext = Extensions::new();
        assert_eq!(bind_request_identity(&mut ext, ada()), BindOutcome::Bound);
        assert_eq!(bind_request_identity(&mut ext, ada()), BindOutcome::Unchanged);

        let other = AuthCtx::new("eve@campus.edu", UserRole::Admin);
        assert_eq!(bind_request_identity(&mut ext, other), BindOutcome::Conflict);
        assert_eq!(ext.get::<AuthCtx>(), Some(&ada()));
    }

    #[test]
    fn connection_binding_is_write_once() {
        let ctx = SecurityContext::new();
        assert!(!ctx.is_bound());

        assert_eq!(ctx.bind(ada()), BindOutcome::Bound);
        assert_eq!(ctx.bind(ada()), BindOutcome::Unchanged);
        assert_eq!(
            ctx.bind(AuthCtx::new("eve@campus.edu", UserRole::Admin)),
            BindOutcome::Conflict
        );
        assert_eq!(ctx.identity(), Some(&ada()));
    }
}

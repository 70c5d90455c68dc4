use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::claims::{IdentityClaims, UserRole, Verification};

/// HMAC keys shorter than this are refused at startup.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("token ttl must be positive")]
    InvalidTtl,
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Wire claims. `iat`/`exp` are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    role: UserRole,
    iat: i64,
    exp: i64,
}

impl TokenClaims {
    fn into_identity(self) -> Option<IdentityClaims> {
        if self.sub.trim().is_empty() {
            return None;
        }
        Some(IdentityClaims {
            subject: self.sub,
            role: self.role,
            issued_at: DateTime::from_timestamp(self.iat, 0)?,
            expires_at: DateTime::from_timestamp(self.exp, 0)?,
        })
    }
}

/// Issues and verifies HS256 identity tokens with one process-wide key.
///
/// - Expiry is evaluated here rather than by `jsonwebtoken`, so an expired
///   token with a good signature still yields its claims (`Verification::Expired`).
/// - Key material never shows up in Debug output.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakSecret);
        }
        let ttl_seconds = i64::try_from(ttl_seconds).map_err(|_| TokenError::InvalidTtl)?;
        let ttl = Duration::try_seconds(ttl_seconds)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(TokenError::InvalidTtl)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, subject: &str, role: UserRole) -> Result<String, TokenError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| {
                error!(error = %e, "failed to sign token");
                TokenError::Sign(e)
            },
        )
    }

    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, Utc::now())
    }

    /// Check the integrity tag, decode the claims, then compare `exp` with `now`.
    ///
    /// Never fails: malformed input is `Verification::Invalid`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Verification {
        let data = match jsonwebtoken::decode::<TokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        ) {
            Ok(data) => data,
            Err(err) => {
                debug!(error = %err, "token rejected");
                return Verification::Invalid;
            }
        };

        let Some(claims) = data.claims.into_identity() else {
            debug!("token rejected: empty subject or timestamp out of range");
            return Verification::Invalid;
        };

        if claims.is_expired_at(now) {
            Verification::Expired(claims)
        } else {
            Verification::Valid(claims)
        }
    }

    /// Subject of a valid or expired token.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        self.verify(token).claims().map(|c| c.subject.clone())
    }

    /// Role of a valid or expired token.
    pub fn extract_role(&self, token: &str) -> Option<UserRole> {
        self.verify(token).claims().map(|c| c.role)
    }
}

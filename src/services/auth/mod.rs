pub mod bearer;
pub mod claims;
pub mod context;
pub mod factory;
pub mod jwt;

pub use bearer::{BearerError, bearer_from_headers, parse_bearer};
pub use claims::{IdentityClaims, UserRole, Verification};
pub use context::{AuthCtx, BindOutcome, SecurityContext, bind_request_identity};
pub use factory::build_token_codec;
pub use jwt::{MIN_SECRET_BYTES, TokenCodec, TokenError};

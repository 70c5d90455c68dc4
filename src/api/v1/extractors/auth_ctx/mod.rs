/**
 * Responsibility
 *  - core と types を束ねる
 *  - handlers に公開する型を制御する
 */
mod core;
mod types;

pub use self::core::{AuthCtxExtractor, MaybeAuthCtx};
pub use types::AuthCtx;

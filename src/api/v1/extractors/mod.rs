/*
 * Responsibility
 * - extractors shared by v1 handlers
 *   - auth_ctx: identity bound by the request gate
 *   - resource_id: numeric path ids (projects, tasks)
 */
pub mod auth_ctx;
pub mod resource_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor, MaybeAuthCtx};
pub use resource_id::{ProjectId, TaskId};

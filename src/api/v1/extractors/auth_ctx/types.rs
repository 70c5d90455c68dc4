/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の検証は middleware/services 側の責務
 * - subject と role は token から取り出したもの (credential record は存在確認のみ)
 */
pub use crate::services::auth::AuthCtx;

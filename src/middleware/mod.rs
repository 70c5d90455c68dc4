/*
 * Responsibility
 * - middleware entry points (re-export)
 * - auth::access (request gate), cors, http (request id / limits / tracing)
 */
pub mod auth;
pub mod cors;
pub mod http;

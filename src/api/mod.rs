/*
 * Responsibility
 * - HTTP API のバージョン単位を束ねる
 */
pub mod v1;

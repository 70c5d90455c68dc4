//! Authentication and authorization core shared by the HTTP API and the
//! STOMP-over-WebSocket notification channel.
//!
//! - `services::auth`: token codec, bearer parsing, bound identity
//! - `middleware::auth`: per-request gate
//! - `ws`: channel handshake gate and connection driver
//! - `services::permission`: project/task permission resolver

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
pub mod ws;

/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (request gate / CORS / request-id / trace)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::repos::{InMemoryDirectory, PgMembershipRepo, PgTaskRepo, PgUserRepo};
use crate::services::auth::build_token_codec;
use crate::state::AppState;
use crate::{api, ws};

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,campus_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = router(state);
    let app = middleware::cors::apply(app, &config);
    let app = middleware::http::apply(app, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let tokens = build_token_codec(config)?;

    let state = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;

            AppState::new(
                tokens,
                Arc::new(PgUserRepo::new(db.clone())),
                Arc::new(PgMembershipRepo::new(db.clone())),
                Arc::new(PgTaskRepo::new(db)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory directory");
            let dir = Arc::new(InMemoryDirectory::new());
            AppState::new(tokens, dir.clone(), dir.clone(), dir)
        }
    };

    Ok(state.with_channel_origins(ws::ChannelOrigins::from_config(config)))
}

/// API routes behind the request gate, plus the channel endpoint.
///
/// `/ws` is not behind the request gate: the channel authenticates on its
/// own connect frame.
pub fn router(state: AppState) -> Router {
    let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());

    Router::new()
        .nest("/api/v1", v1)
        .route("/ws", get(ws::ws_handler))
        .fallback(|| async { AppError::not_found("route") })
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

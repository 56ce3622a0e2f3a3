/*
 * Responsibility
 * - Config読み込み → 依存生成 (Auth0 verifier / tool registry) → Router 組み立て
 * - Middleware の適用 (http / CORS、/mcp の Bearer は routes 側)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::{ProtectedResource, build_authenticator};
use crate::services::tools::{ToolRegistry, register_tools};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG=info,auth0_mcp_server=debug,tower_http=debug cargo run
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
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("invalid configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting MCP server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(server_url = %config.server_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let (authenticator, issuer) = build_authenticator(config)?;

    let mut registry = ToolRegistry::default();
    register_tools(&mut registry)?;

    let resource = ProtectedResource::new(config.server_url.clone(), issuer, registry.scopes());
    tracing::info!(
        tools = registry.len(),
        issuer = %resource.document().authorization_servers.join(","),
        metadata = %resource.metadata_url(),
        "tool registry ready"
    );

    Ok(AppState::new(
        authenticator,
        Arc::new(registry),
        Arc::new(resource),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::mcp::routes(state.clone()).with_state(state);

    let router = middleware::http::apply(router);
    middleware::cors::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

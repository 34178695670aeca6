// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only unless bound elsewhere via config.
// Authentication is left to whatever sits in front of the daemon.
//
// Endpoints:
//   GET  /
//   POST /generate
//   POST /generate/simple
//   POST /generate/advanced
//   GET  /examples

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(routes::health::liveness))
        .route("/generate", post(routes::generate::custom))
        .route("/generate/simple", post(routes::generate::simple))
        .route("/generate/advanced", post(routes::generate::advanced))
        .route("/examples", get(routes::examples::list_examples))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

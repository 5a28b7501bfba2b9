//! Main HTTP gateway server: shared state, routing, and the listener loop.

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use fingate_config::{GatewayConfig, SecretString, SessionSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument};

use crate::allowlist::RouteTable;
use crate::health_api;
use crate::proxy;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::signing::RequestSigner;
use crate::upstream::UpstreamClient;

/// Application state shared across routes.
///
/// Everything here is built once from configuration and read-only
/// afterwards, except the rate-limit store which synchronizes internally.
#[derive(Clone)]
pub struct GatewayState {
    pub routes: Arc<RouteTable>,
    pub signer: Arc<RequestSigner>,
    pub rate_limiter: RateLimiter,
    pub upstream: UpstreamClient,
    pub api_key: SecretString,
    pub session: SessionSettings,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let routes = RouteTable::from_specs(&config.allowlist.routes)?;
        let signer = RequestSigner::new(
            config.signing.identity.clone(),
            config.signing.signing_secret.clone(),
        )
        .context("Failed to build request signer")?;
        let upstream = UpstreamClient::new(
            config.upstream.base_url.clone(),
            Duration::from_secs(config.upstream.timeout_secs),
        )
        .context("Failed to build upstream client")?;
        let rate_limiter = RateLimiter::in_memory(RateLimitPolicy {
            max_requests: config.rate_limit.max_requests,
            window: Duration::from_secs(config.rate_limit.window_secs),
        });

        info!(
            routes = routes.len(),
            upstream = %upstream.base_url(),
            client_id = %signer.identity().client_id,
            "Gateway state initialized"
        );

        Ok(Self {
            routes: Arc::new(routes),
            signer: Arc::new(signer),
            rate_limiter,
            upstream,
            api_key: config.upstream.api_key.clone(),
            session: config.session.clone(),
            started_at: Instant::now(),
        })
    }

    /// Swap the rate-limit store, e.g. for a shared backend.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/gateway", get(proxy::proxy_get).post(proxy::proxy_post))
        .route("/gateway/logout", post(proxy::logout))
        .route("/api/health", get(health_api::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically evict expired rate-limit buckets.
pub fn spawn_rate_limit_sweeper(rate_limiter: RateLimiter, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = rate_limiter.sweep_expired().await;
            if removed > 0 {
                debug!(removed, "Swept expired rate-limit buckets");
            }
        }
    })
}

/// Starts the gateway HTTP server and blocks until it stops.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState, sweep_every: Duration) -> Result<()> {
    if !sweep_every.is_zero() {
        spawn_rate_limit_sweeper(state.rate_limiter.clone(), sweep_every);
    }

    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind gateway listener on {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

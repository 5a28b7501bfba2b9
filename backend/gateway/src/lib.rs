//! fingate Gateway HTTP Server
//!
//! Brokers browser calls to the upstream financial API: allow-list,
//! per-client rate limiting, request signing, and the session cookie.

pub mod allowlist;
pub mod auth;
pub mod error;
pub mod headers;
pub mod health_api;
pub mod proxy;
pub mod rate_limit;
pub mod server;
pub mod session_cookie;
pub mod signing;
pub mod upstream;

pub use allowlist::{RouteTable, RouteTemplate};
pub use error::{GatewayError, GatewayResult};
pub use rate_limit::{InMemoryRateLimitStore, RateDecision, RateLimitPolicy, RateLimitStore, RateLimiter};
pub use server::{build_router, start_server, GatewayState};
pub use signing::RequestSigner;
pub use upstream::UpstreamClient;

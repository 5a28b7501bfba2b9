//! Config defaults: values applied when an optional env var is unset.

use crate::schema::RouteSpec;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

/// Session cookie lifetime (24h).
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "token";

pub const DEFAULT_SIGNIN_PATH: &str = "/client/v2/auth/signin";

/// Requests allowed per client per window.
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_RATE_LIMIT_SWEEP_SECS: u64 = 300;

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upstream paths the gateway forwards to when no allow-list file is given.
///
/// Several of these take trailing path segments (`/client/v2/loans/{id}`),
/// which the prefix rule admits.
pub const DEFAULT_ALLOWED_ENDPOINTS: &[&str] = &[
    "/client/v2/auth/signup",
    "/client/v2/auth/signin",
    "/client/v2/auth/verify-otp",
    "/client/v2/auth/resend-otp",
    "/client/v2/auth/forgot-password",
    "/client/v2/auth/reset-password",
    "/client/v2/user/profile",
    "/client/v2/business/onboarding",
    "/client/v2/wallet",
    "/client/v2/transfers",
    "/client/v2/loans",
    "/client/v2/inventory",
    "/client/v2/marketplace",
];

/// Built-in allow-list as route specs permitting any brokered method.
pub fn default_routes() -> Vec<RouteSpec> {
    DEFAULT_ALLOWED_ENDPOINTS
        .iter()
        .map(|path| RouteSpec::any(*path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes_cover_signin() {
        let routes = default_routes();
        assert!(routes.iter().any(|r| r.path == DEFAULT_SIGNIN_PATH));
        assert!(routes.iter().all(|r| r.methods.is_empty()));
    }

    #[test]
    fn default_paths_are_absolute() {
        assert!(DEFAULT_ALLOWED_ENDPOINTS.iter().all(|p| p.starts_with('/')));
    }
}

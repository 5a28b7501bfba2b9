//! Config validation: semantic checks with user-friendly error messages.

use crate::schema::GatewayConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &GatewayConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_upstream(config, &mut report);
    validate_rate_limit(config, &mut report);
    validate_allowlist(config, &mut report);
    validate_session(config, &mut report);
    report
}

fn validate_upstream(config: &GatewayConfig, report: &mut ValidationReport) {
    let url = &config.upstream.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error(
            "upstream.baseUrl",
            format!("'{url}' must start with http:// or https://"),
        );
    } else if url.starts_with("http://") {
        report.warn("upstream.baseUrl", "Upstream is reached over plain http");
    }
    if config.upstream.timeout_secs == 0 {
        report.error("upstream.timeoutSecs", "timeoutSecs must be >= 1");
    }
}

fn validate_rate_limit(config: &GatewayConfig, report: &mut ValidationReport) {
    if config.rate_limit.max_requests == 0 {
        report.error("rateLimit.maxRequests", "maxRequests must be >= 1");
    }
    if config.rate_limit.window_secs == 0 {
        report.error("rateLimit.windowSecs", "windowSecs must be >= 1");
    }
}

fn validate_allowlist(config: &GatewayConfig, report: &mut ValidationReport) {
    let routes = &config.allowlist.routes;
    if routes.is_empty() {
        report.error("allowlist.routes", "Allow-list is empty; every request would be rejected");
    }
    for (i, route) in routes.iter().enumerate() {
        if !route.path.starts_with('/') {
            report.error(
                format!("allowlist.routes[{i}].path"),
                format!("'{}' must start with '/'", route.path),
            );
        }
    }
}

fn validate_session(config: &GatewayConfig, report: &mut ValidationReport) {
    let session = &config.session;
    if session.cookie_name.is_empty()
        || session
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '='))
    {
        report.error(
            "session.cookieName",
            format!("'{}' is not a valid cookie name", session.cookie_name),
        );
    }
    let covered = config
        .allowlist
        .routes
        .iter()
        .any(|r| session.signin_path.starts_with(&r.path));
    if !covered {
        report.warn(
            "session.signinPath",
            format!(
                "'{}' is not on the allow-list; sessions will never be issued",
                session.signin_path
            ),
        );
    }
}

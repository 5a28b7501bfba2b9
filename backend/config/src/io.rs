//! Allow-list file loading.
//!
//! The file is YAML:
//!
//! ```yaml
//! routes:
//!   - path: /client/v2/auth/signin
//!     methods: [POST]
//!   - path: /client/v2/wallet
//! ```

use crate::schema::RouteSpec;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Deserialize)]
struct AllowlistFile {
    #[serde(default)]
    routes: Vec<RouteSpec>,
}

/// Parse allow-list YAML into route specs.
pub fn parse_allowlist(raw: &str) -> Result<Vec<RouteSpec>> {
    let file: AllowlistFile =
        serde_yaml::from_str(raw).context("Failed to parse allow-list YAML")?;
    Ok(file.routes)
}

/// Load and parse an allow-list file from disk.
///
/// A configured file that cannot be read or parsed is an error; there is no
/// fallback to the built-in list.
pub async fn load_allowlist(path: &Path) -> Result<Vec<RouteSpec>> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read allow-list file: {}", path.display()))?;

    let routes = parse_allowlist(&raw)
        .with_context(|| format!("Invalid allow-list file: {}", path.display()))?;

    info!(path = %path.display(), routes = routes.len(), "Loaded allow-list");
    Ok(routes)
}

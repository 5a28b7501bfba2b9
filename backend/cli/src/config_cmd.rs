//! CLI Config Command
//!
//! Loads the configuration the way `serve` would and prints it masked,
//! followed by any validation findings.

use anyhow::{Context, Result};

use fingate_config::{load_allowlist, load_from_env, redacted_snapshot, validate};

pub async fn run() -> Result<()> {
    let mut config = load_from_env().context("Gateway configuration is incomplete")?;
    if let Some(path) = config.allowlist.file.clone() {
        config.allowlist.routes = load_allowlist(&path).await?;
    }

    println!("{}", serde_json::to_string_pretty(&redacted_snapshot(&config))?);

    let report = validate(&config);
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }
    if report.is_valid() {
        println!("\nConfiguration is valid ({} allowed route(s)).", config.allowlist.routes.len());
    } else {
        anyhow::bail!("configuration has {} error(s)", report.errors.len());
    }

    Ok(())
}

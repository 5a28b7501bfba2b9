//! CLI Status Command
//!
//! Probes `/api/health` on a locally running gateway.

use anyhow::Result;
use std::time::Duration;

use fingate_config::defaults::DEFAULT_PORT;
use fingate_config::env::ENV_PORT;

pub async fn run(port: Option<u16>) -> Result<()> {
    let port = port
        .or_else(|| std::env::var(ENV_PORT).ok().and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client
        .get(format!("http://localhost:{port}/api/health"))
        .send()
        .await
    {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            println!("fingate is not running on port {port}");
        }
    }

    Ok(())
}

use std::time::{Duration, Instant};

use clap::Args;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Args)]
pub struct PingArgs {
    #[arg(help = "Server base URL (defaults to the configured public URL)")]
    pub url: Option<String>,

    #[arg(long, default_value_t = 5, help = "Request timeout in seconds")]
    pub timeout: u64,
}

pub async fn handle(args: PingArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args.url.unwrap_or_else(|| config().server.public_url.clone());
    let health_url = format!("{}/health", base.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let started = Instant::now();
    let response = match client.get(&health_url).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(&output_format, &format!("{} is unreachable: {}", base, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };
    let elapsed_ms = started.elapsed().as_millis();
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            &output_format,
            &format!("{} is healthy ({} ms)", base, elapsed_ms),
            Some(json!({ "url": base, "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )
    } else {
        output_error(
            &output_format,
            &format!("{} reported {} ({} ms)", base, status, elapsed_ms),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server unhealthy")
    }
}

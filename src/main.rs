use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rogp", version, about = "Query a game server over OGP")]
struct Cli {
    /// Host name or IP address of the server.
    host: String,
    /// Query port.
    port: u16,
    /// Total time allowed for the query, in seconds.
    #[arg(default_value_t = 5)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    debug!("Querying {}:{} with timeout {:?}", cli.host, cli.port, timeout);
    let status = rogp::query(&cli.host, cli.port, timeout)
        .await
        .with_context(|| format!("query to {}:{} failed", cli.host, cli.port))?;

    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}

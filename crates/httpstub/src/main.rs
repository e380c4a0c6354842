use anyhow::Context;
use clap::Parser;
use httpstub::config::StubConfig;
use httpstub::StubServer;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "httpstub",
    about = "Programmable HTTP stub server for test suites"
)]
struct Args {
    /// Expectation file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Port to bind on localhost; 0 picks an unused port
    #[arg(short, long, default_value = "0")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let server = StubServer::start_on(addr).await?;

    if let Some(path) = &args.config {
        let config = StubConfig::from_file(path)?;
        let expectations = config.to_expectations()?;
        let count = expectations.len();
        for (request, response) in expectations {
            server.expect(request, response);
        }
        info!("registered {count} expectation(s) from {}", path.display());
    }

    info!("serving on {}", server.base_url());
    info!("press ctrl-c to stop and verify");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    // Verification failures propagate as a non-zero exit.
    server.shutdown().await?;
    info!("all expectations met, no unexpected requests");
    Ok(())
}

//! Risk parameter engine node entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// AMM risk parameter engine node
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RPE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the publish channel id
    #[arg(long)]
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    rpe_telemetry::init_logging()?;

    info!("Starting rpe-node v{}", env!("CARGO_PKG_VERSION"));

    let mut config = rpe_node::NodeConfig::load(args.config)?;

    if let Some(channel) = args.channel {
        config.publisher.publisher.channel_id = channel;
    }
    info!(
        channel = %config.publisher.publisher.channel_id,
        sources = config.consensus.sources.len(),
        "Configuration loaded"
    );

    let app = rpe_node::Application::new(config)?;
    app.run().await?;

    Ok(())
}

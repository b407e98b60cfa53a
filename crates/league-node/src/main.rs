//! League node binary
//!
//! Serves the weekly tier league: interactive joins and leaderboards,
//! plus the scheduler-facing finalize trigger.

use league_node::{LeagueConfig, LeagueNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "league_node=info,league=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting League Node");

    let config = LeagueConfig::from_env();

    let node = LeagueNode::new(config)?;
    node.run().await?;

    Ok(())
}

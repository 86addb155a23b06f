//! Edge emulator binary.
//!
//! Loads and validates the configuration, then serves the edge pipeline.
//! No edge functions are registered here; a host embeds the library and
//! registers implementations of [`edgefront::EdgeFunction`] under the
//! names the configuration binds. Unbound checkpoints pass requests
//! through untouched.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edgefront::logs::LogStore;
use edgefront::{load_config, FunctionRegistry, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "edgefront", about = "Local CDN edge-compute emulator", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "edgefront.toml")]
    config: PathBuf,

    /// Bind address, overriding the configured listener.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edgefront=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("edgefront v0.1.0 starting");

    let config = Arc::new(load_config(&args.config)?);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        distributions = config.distributions.len(),
        subscriptions = config.subscriptions.len(),
        "Configuration loaded"
    );

    let store = Arc::new(LogStore::new());
    let registry = Arc::new(FunctionRegistry::new(Arc::clone(&store)));

    for distribution in &config.distributions {
        for behavior in &distribution.behaviors {
            for (event_type, function) in &behavior.functions {
                if !registry.contains(function) {
                    tracing::warn!(
                        distribution = %distribution.id,
                        event_type = %event_type,
                        function = %function,
                        "Bound function is not registered; its checkpoint will respond with an error"
                    );
                }
            }
        }
    }
    for subscription in &config.subscriptions {
        if !registry.contains(&subscription.destination) {
            tracing::warn!(
                subscription = %subscription.name,
                destination = %subscription.destination,
                "Subscription destination is not registered; its deliveries will be dropped"
            );
        }
    }

    let bind_address = args
        .bind
        .as_deref()
        .unwrap_or(&config.listener.bind_address);
    let listener = TcpListener::bind(bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let server = HttpServer::new(config, registry, store);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

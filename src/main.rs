use collection_node::config::NodeConfig;
use collection_node::node::service::CollectionNode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("{}", NodeConfig::USAGE);
            eprintln!(
                "Example: collection-node --collection accounts --primary-key accountId \
--service customers=http://customer-service --relation customers=_customerIds"
            );
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    tracing::info!(
        "Starting {} node on host {}",
        config.collection.name,
        std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
    );

    // 1. Wire store, population, discovery and HTTP handlers:
    let node = CollectionNode::new(&config)?;

    // 2. Populate and check sibling addresses in the background:
    let _background = node.start_background();

    // 3. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, node.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("{} node stopped", config.collection.name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received interrupt signal, shutting down");
}

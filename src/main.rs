use mcp_n8n_bridge::config::BridgeConfig;
use mcp_n8n_bridge::server::BridgeServer;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mcp_n8n_bridge=debug")),
        )
        .init();

    let config = match BridgeConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-n8n-bridge: configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = BridgeServer::new(config).run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

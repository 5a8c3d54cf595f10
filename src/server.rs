use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::BridgeConfig;
use crate::dispatch::Dispatcher;
use crate::handlers;
use crate::registry::MethodRegistry;
use crate::remote::N8nClient;

/// HTTP front end: one shared n8n client and an immutable method registry.
pub struct BridgeServer {
    config: BridgeConfig,
}

impl BridgeServer {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Build the dispatcher around the n8n client and the built-in registry.
    pub fn dispatcher(&self) -> Result<Arc<Dispatcher>, Box<dyn std::error::Error>> {
        let registry = MethodRegistry::n8n();
        registry
            .compile_schemas()
            .map_err(|(method, e)| format!("parameter schema for {method} is invalid: {e}"))?;

        let client = N8nClient::new(&self.config)?;
        info!(
            base_url = %client.base_url(),
            authenticated = self.config.api_key.is_some(),
            timeout_secs = self.config.timeout.as_secs_f64(),
            "Initialised n8n client"
        );

        Ok(Arc::new(Dispatcher::new(
            Arc::new(registry),
            Arc::new(client),
            self.config.timeout,
        )))
    }

    /// Serve until Ctrl+C or SIGTERM, then drop the client.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let dispatcher = self.dispatcher()?;
        let app = handlers::router(dispatcher);

        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "MCP bridge listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("n8n client closed");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}

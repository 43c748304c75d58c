//! tx_indexer - ledger scanner and per-address transaction index
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ JSON-RPC │───▶│ Scanner  │───▶│  Store   │───▶│ Gateway  │
//! │  node    │    │(bwd+fwd) │    │(per addr)│    │  (REST)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `tx_indexer [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use tx_indexer::config::AppConfig;
use tx_indexer::gateway;
use tx_indexer::rpc::HttpRpcClient;
use tx_indexer::scanner::BlockScanner;
use tx_indexer::shutdown::{ShutdownSignal, shutdown_on_os_signal};
use tx_indexer::store::MemoryStore;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)
        .with_context(|| format!("Failed to load configuration for env '{}'", env))?
        .with_env_overrides();
    let _log_guard = tx_indexer::logging::init_logging(&app_config);

    info!("Starting tx_indexer in {} mode", env);

    let client = HttpRpcClient::with_timeout(&app_config.rpc.url, app_config.rpc.timeout())
        .context("Failed to build JSON-RPC client")?;
    let store = MemoryStore::with_visibility(app_config.store.read_visibility);
    info!("Store read visibility: {:?}", store.visibility());

    let scanner = BlockScanner::new(
        Arc::new(client),
        Arc::new(store),
        app_config.scanner.clone(),
    );

    let shutdown = ShutdownSignal::new();
    scanner.start(shutdown.clone());

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    let host = app_config.gateway.host.clone();
    let server = tokio::spawn({
        let facade = Arc::new(scanner.clone());
        let shutdown = shutdown.clone();
        async move {
            let result = gateway::run_server(&host, port, facade, shutdown.clone()).await;
            if result.is_err() {
                // bind failure or serve error takes the whole process down
                shutdown.request_shutdown();
            }
            result
        }
    });

    tokio::select! {
        _ = shutdown_on_os_signal(shutdown.clone()) => {}
        _ = shutdown.requested() => {}
    }

    scanner.stop().await;

    match server.await {
        Ok(Ok(())) => info!("Gateway stopped"),
        Ok(Err(e)) => {
            error!("Gateway failed: {}", e);
            return Err(e).context("Gateway server error");
        }
        Err(e) => error!("Gateway task ended abnormally: {}", e),
    }

    info!("Shutdown complete");
    Ok(())
}

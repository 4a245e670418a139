// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keeper serve`: open storage, build the vault service, and run the
//! gateway until a shutdown signal arrives.

use std::sync::Arc;

use tracing::{info, warn};

use keeper_config::KeeperConfig;
use keeper_core::KeeperError;
use keeper_gateway::{GatewayState, ServerConfig};
use keeper_service::VaultService;

/// Runs the `keeper serve` command.
pub async fn run_serve(config: KeeperConfig) -> Result<(), KeeperError> {
    init_tracing(&config.server.log_level);

    info!(
        database = %config.storage.database_path,
        wal_mode = config.storage.wal_mode,
        "starting keeper serve"
    );

    let service = Arc::new(VaultService::from_config(&config).await?);
    info!(storage = service.store_name(), "vault service ready");

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = GatewayState {
        service: Arc::clone(&service),
    };

    let served = keeper_gateway::start_server(&server_config, state, shutdown_signal()).await;

    if let Err(e) = service.close().await {
        warn!(error = %e, "storage close failed");
    }
    served?;
    info!("keeper serve shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                    _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await;
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("keeper={log_level},tower_http={log_level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeper - a multi-user encrypted credential vault.
//!
//! This is the binary entry point for the Keeper server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use keeper_config::{ConfigError, KeeperConfig};

/// Keeper - a multi-user encrypted credential vault.
#[derive(Parser, Debug)]
#[command(name = "keeper", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the vault server.
    Serve,
    /// Validate configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<KeeperConfig, Vec<ConfigError>> {
    match path {
        Some(path) => keeper_config::load_and_validate_path(path),
        None => keeper_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("keeper: use --help for available commands");
        return;
    };

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            keeper_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match command {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("keeper: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!(
                "keeper: config OK (listen={}:{}, database={})",
                config.server.host, config.server.port, config.storage.database_path
            );
        }
    }
}

use clap::Subcommand;
use raffle_core::{RaffleConfig, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "raffle.json";

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Network preset (hardhat, localhost, goerli)
        #[arg(short, long)]
        network: Option<String>,
    },
    /// Write a network preset to the data directory
    Init {
        /// Network preset (hardhat, localhost, goerli)
        #[arg(short, long)]
        network: Option<String>,
    },
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Network preset if one is named, else the saved file, else local defaults
pub fn resolve_config(data_dir: &Path, network: Option<&str>) -> Result<RaffleConfig> {
    if let Some(network) = network {
        return RaffleConfig::for_network(network);
    }

    let path = config_path(data_dir);
    if path.exists() {
        tracing::debug!("Loading configuration from {}", path.display());
        return RaffleConfig::load(&path);
    }

    Ok(RaffleConfig::default())
}

pub async fn handle_config_command(cmd: ConfigCommands, data_dir: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Show { network } => {
            let config = resolve_config(data_dir, network.as_deref())?;
            config.validate()?;

            println!("Network: {}", config.network);
            println!("  Development: {}", config.is_development());
            println!("  Ticket price: {}", config.ticket_price);
            println!("  Interval: {}s", config.interval.as_secs());
            println!("Oracle:");
            println!(
                "  Coordinator: {}",
                config.oracle.coordinator.as_deref().unwrap_or("local mock")
            );
            println!("  Key hash: {}", config.oracle.key_hash);
            println!("  Subscription: {}", config.oracle.subscription_id);
            println!("  Confirmations: {}", config.oracle.request_confirmations);
            println!("  Callback gas limit: {}", config.oracle.callback_gas_limit);
            println!("  Words per request: {}", config.oracle.num_words);
        }

        ConfigCommands::Init { network } => {
            let config = match network.as_deref() {
                Some(network) => RaffleConfig::for_network(network)?,
                None => RaffleConfig::default(),
            };
            config.validate()?;

            let path = config_path(data_dir);
            config.save(&path)?;
            println!("Wrote {} configuration to {}", config.network, path.display());
        }
    }

    Ok(())
}

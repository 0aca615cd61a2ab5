mod commands;

use clap::{Parser, Subcommand};
use raffle_core::RaffleError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "raffle")]
#[command(about = "Raffle lifecycle driver with a simulated keeper and randomness oracle")]
#[command(version)]
struct Cli {
    /// Data directory for the raffle configuration
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration commands
    #[command(subcommand)]
    Config(commands::ConfigCommands),

    /// Run rounds against a local mock oracle
    Simulate(commands::SimulateArgs),

    /// Replay a reference scenario
    Scenario {
        /// Scenario name (a or b)
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "raffle={},raffle_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("raffle")
    });

    let result = match cli.command {
        Commands::Config(cmd) => commands::handle_config_command(cmd, &data_dir).await,
        Commands::Simulate(args) => commands::simulate(args, &data_dir).await,
        Commands::Scenario { name } => commands::run_scenario(&name).await,
    };

    if let Err(e) = result {
        match e {
            RaffleError::Config(msg) => {
                eprintln!("Error: invalid configuration: {}", msg);
                eprintln!("Use 'raffle config show' to inspect the effective configuration");
            }
            RaffleError::PayoutFailed(msg) => {
                eprintln!("Error: payout failed, round stays calculating until the callback is redelivered");
                eprintln!("{}", msg);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

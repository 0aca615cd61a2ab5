pub mod config;
pub mod scenario;
pub mod simulate;

pub use config::{handle_config_command, ConfigCommands};
pub use scenario::run_scenario;
pub use simulate::{simulate, SimulateArgs};

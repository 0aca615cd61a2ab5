//! Raffle core - round lifecycle for a fixed-price raffle
//!
//! Players buy tickets while a round is open. A keeper periodically asks
//! whether the round should close; when it does, randomness is requested
//! from an oracle, and the oracle's later callback picks the winner, pays
//! out the pot and reopens the raffle.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod keeper;
pub mod ledger;
pub mod oracle;
pub mod payout;
pub mod raffle;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{OracleConfig, RaffleConfig};
pub use error::{RaffleError, Result};
pub use events::RaffleEvent;
pub use gate::{is_upkeep_needed, UpkeepStatus};
pub use keeper::{Keeper, TickOutcome};
pub use ledger::{Entry, Ledger, LedgerSnapshot};
pub use oracle::{MockVrfCoordinator, RandomnessConsumer, RandomnessOracle, RandomnessRequest};
pub use payout::{InMemoryBank, PayoutSink};
pub use raffle::{Raffle, RaffleInfo};
pub use types::{Address, Amount, RaffleState, RequestId};

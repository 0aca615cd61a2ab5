use crate::types::{Address, Amount, RequestId};
use serde::{Deserialize, Serialize};

/// Observations emitted as the raffle moves through a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaffleEvent {
    Entered {
        round: u64,
        player: Address,
        amount: Amount,
    },
    WinnerRequested {
        round: u64,
        request_id: RequestId,
    },
    WinnerPicked {
        round: u64,
        request_id: RequestId,
        winner: Address,
        prize: Amount,
    },
}

impl RaffleEvent {
    pub fn round(&self) -> u64 {
        match self {
            RaffleEvent::Entered { round, .. }
            | RaffleEvent::WinnerRequested { round, .. }
            | RaffleEvent::WinnerPicked { round, .. } => *round,
        }
    }
}

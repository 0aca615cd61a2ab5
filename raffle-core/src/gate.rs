//! Admission predicate for closing a round.

use crate::types::RaffleState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Each condition the gate checks, evaluated against one snapshot of round state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    pub fn evaluate(
        now: DateTime<Utc>,
        round_start: DateTime<Utc>,
        interval: Duration,
        state: RaffleState,
        player_count: usize,
        pot_nonzero: bool,
    ) -> Self {
        // a clock behind the round start never counts as elapsed
        let time_passed = now
            .signed_duration_since(round_start)
            .to_std()
            .map_or(false, |elapsed| elapsed >= interval);

        Self {
            is_open: state == RaffleState::Open,
            time_passed,
            has_players: player_count > 0,
            has_balance: pot_nonzero,
        }
    }

    pub fn is_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

pub fn is_upkeep_needed(
    now: DateTime<Utc>,
    round_start: DateTime<Utc>,
    interval: Duration,
    state: RaffleState,
    player_count: usize,
    pot_nonzero: bool,
) -> bool {
    UpkeepStatus::evaluate(now, round_start, interval, state, player_count, pot_nonzero).is_needed()
}

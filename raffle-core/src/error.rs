use crate::types::{Amount, RaffleState, RequestId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RaffleError>;

#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Insufficient payment: need {need}, sent {sent}")]
    InsufficientPayment { need: Amount, sent: Amount },

    #[error("Raffle is not open")]
    RaffleNotOpen,

    #[error("Upkeep not needed: pot {pot}, {players} players, state {state}")]
    UpkeepNotNeeded {
        pot: Amount,
        players: usize,
        state: RaffleState,
    },

    #[error("Unknown randomness request: {0}")]
    UnknownRequest(RequestId),

    #[error("Payout failed: {0}")]
    PayoutFailed(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Player index {index} out of bounds ({len} players)")]
    PlayerIndexOutOfBounds { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RaffleError {
    pub fn payout(msg: impl Into<String>) -> Self {
        Self::PayoutFailed(msg.into())
    }

    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

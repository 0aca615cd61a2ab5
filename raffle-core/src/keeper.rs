//! Polling upkeep scheduler.

use crate::error::{RaffleError, Result};
use crate::raffle::Raffle;
use crate::types::RequestId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Round still running or nothing to close
    Idle,
    /// Upkeep fired and produced this request
    Performed(RequestId),
    /// Round is closed and the oracle has not answered yet
    AwaitingRandomness(RequestId),
}

pub struct Keeper {
    raffle: Arc<Raffle>,
    poll_interval: Duration,
}

impl Keeper {
    pub fn new(raffle: Arc<Raffle>, poll_interval: Duration) -> Self {
        Self {
            raffle,
            poll_interval,
        }
    }

    pub async fn tick(&self) -> Result<TickOutcome> {
        let now = self.raffle.clock().now();

        if !self.raffle.check_upkeep(now).await {
            if let Some(request_id) = self.raffle.pending_request().await {
                tracing::debug!("Still awaiting randomness for request {}", request_id);
                return Ok(TickOutcome::AwaitingRandomness(request_id));
            }
            return Ok(TickOutcome::Idle);
        }

        match self.raffle.perform_upkeep(now).await {
            Ok(request_id) => Ok(TickOutcome::Performed(request_id)),
            // someone else closed the round between check and perform
            Err(RaffleError::UpkeepNotNeeded { .. }) => {
                tracing::debug!("Upkeep lost race, round already closed");
                Ok(TickOutcome::Idle)
            }
            Err(e) => Err(e),
        }
    }

    /// Poll until `shutdown` turns true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!("Keeper polling every {:?}", self.poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Performed(request_id)) => {
                            tracing::info!("Keeper performed upkeep, request {}", request_id);
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!("Keeper upkeep failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Keeper stopped");
    }
}

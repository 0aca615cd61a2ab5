use crate::clock::Clock;
use crate::config::RaffleConfig;
use crate::error::{RaffleError, Result};
use crate::events::RaffleEvent;
use crate::gate::UpkeepStatus;
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::oracle::{RandomnessConsumer, RandomnessOracle, RandomnessRequest};
use crate::payout::PayoutSink;
use crate::types::{Address, Amount, RaffleState, RequestId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

const EVENT_CAPACITY: usize = 256;

/// Everything that changes over a round. Guarded as one unit.
#[derive(Debug)]
struct RoundState {
    state: RaffleState,
    number: u64,
    ledger: Ledger,
    started_at: DateTime<Utc>,
    pending_request: Option<RequestId>,
    recent_winner: Option<Address>,
}

impl RoundState {
    fn upkeep_status(&self, now: DateTime<Utc>, interval: Duration) -> UpkeepStatus {
        UpkeepStatus::evaluate(
            now,
            self.started_at,
            interval,
            self.state,
            self.ledger.player_count(),
            !self.ledger.pot().is_zero(),
        )
    }
}

/// A raffle instance: entries, upkeep-driven closing, and oracle-driven payout.
///
/// `enter`, `perform_upkeep` and the randomness callback each run their whole
/// check-and-mutate sequence under one lock, including the awaits on the
/// oracle and the payout sink.
pub struct Raffle {
    address: Address,
    config: RaffleConfig,
    oracle: Arc<dyn RandomnessOracle>,
    payout: Arc<dyn PayoutSink>,
    clock: Arc<dyn Clock>,
    round: Mutex<RoundState>,
    events: broadcast::Sender<RaffleEvent>,
}

impl Raffle {
    pub fn new(
        address: Address,
        config: RaffleConfig,
        oracle: Arc<dyn RandomnessOracle>,
        payout: Arc<dyn PayoutSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let round = RoundState {
            state: RaffleState::Open,
            number: 1,
            ledger: Ledger::new(config.ticket_price),
            started_at: clock.now(),
            pending_request: None,
            recent_winner: None,
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            "Raffle {} opened on {} (ticket {}, interval {}s)",
            address,
            config.network,
            config.ticket_price,
            config.interval.as_secs()
        );

        Ok(Self {
            address,
            config,
            oracle,
            payout,
            clock,
            round: Mutex::new(round),
            events,
        })
    }

    pub fn config(&self) -> &RaffleConfig {
        &self.config
    }

    pub fn ticket_price(&self) -> Amount {
        self.config.ticket_price
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RaffleEvent> {
        self.events.subscribe()
    }

    /// Buy a ticket for the live round
    pub async fn enter(&self, player: Address, payment: Amount) -> Result<()> {
        let mut round = self.round.lock().await;

        if round.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }

        let index = round.ledger.record_entry(player, payment)?;

        tracing::info!(
            "Player {} entered round {} at position {} with {}",
            player,
            round.number,
            index,
            payment
        );
        self.emit(RaffleEvent::Entered {
            round: round.number,
            player,
            amount: payment,
        });

        Ok(())
    }

    pub async fn check_upkeep(&self, now: DateTime<Utc>) -> bool {
        self.upkeep_status(now).await.is_needed()
    }

    pub async fn upkeep_status(&self, now: DateTime<Utc>) -> UpkeepStatus {
        let round = self.round.lock().await;
        round.upkeep_status(now, self.config.interval)
    }

    /// Close the round and ask the oracle for randomness
    pub async fn perform_upkeep(&self, now: DateTime<Utc>) -> Result<RequestId> {
        let mut round = self.round.lock().await;

        let status = round.upkeep_status(now, self.config.interval);
        if !status.is_needed() {
            tracing::debug!("Upkeep not needed for round {}: {:?}", round.number, status);
            return Err(RaffleError::UpkeepNotNeeded {
                pot: round.ledger.pot(),
                players: round.ledger.player_count(),
                state: round.state,
            });
        }

        let request = RandomnessRequest::new(self.address, &self.config.oracle);
        let request_id = self.oracle.request_randomness(request).await?;

        round.state = RaffleState::Calculating;
        round.pending_request = Some(request_id);

        tracing::info!(
            "Round {} closed with {} players, requested randomness {}",
            round.number,
            round.ledger.player_count(),
            request_id
        );
        self.emit(RaffleEvent::WinnerRequested {
            round: round.number,
            request_id,
        });

        Ok(request_id)
    }

    async fn finalize(&self, request_id: RequestId, random_words: Vec<u64>) -> Result<()> {
        let mut round = self.round.lock().await;

        if round.state != RaffleState::Calculating || round.pending_request != Some(request_id) {
            tracing::warn!(
                "Rejected randomness for request {} (pending: {:?})",
                request_id,
                round.pending_request
            );
            return Err(RaffleError::UnknownRequest(request_id));
        }

        let random_value = *random_words
            .first()
            .ok_or_else(|| RaffleError::internal("Randomness callback carried no words"))?;

        let snapshot = round.ledger.snapshot();
        let (winner, prize) = select_winner(&snapshot, random_value)?;

        if let Err(e) = self.payout.pay(winner, prize).await {
            tracing::warn!(
                "Payout of {} to {} failed, round {} stays calculating: {}",
                prize,
                winner,
                round.number,
                e
            );
            return Err(match e {
                RaffleError::PayoutFailed(_) => e,
                other => RaffleError::payout(other.to_string()),
            });
        }

        let finished = round.number;
        round.recent_winner = Some(winner);
        round.started_at = self.clock.now();
        round.ledger.clear();
        round.pending_request = None;
        round.number += 1;
        round.state = RaffleState::Open;

        tracing::info!(
            "Round {} won by {} for {} (request {})",
            finished,
            winner,
            prize,
            request_id
        );
        self.emit(RaffleEvent::WinnerPicked {
            round: finished,
            request_id,
            winner,
            prize,
        });

        Ok(())
    }

    pub async fn state(&self) -> RaffleState {
        self.round.lock().await.state
    }

    pub async fn round(&self) -> u64 {
        self.round.lock().await.number
    }

    pub async fn pot(&self) -> Amount {
        self.round.lock().await.ledger.pot()
    }

    pub async fn player_count(&self) -> usize {
        self.round.lock().await.ledger.player_count()
    }

    pub async fn player(&self, index: usize) -> Result<Address> {
        self.round.lock().await.ledger.player(index)
    }

    pub async fn players(&self) -> Vec<Address> {
        self.round.lock().await.ledger.players()
    }

    pub async fn recent_winner(&self) -> Option<Address> {
        self.round.lock().await.recent_winner
    }

    pub async fn round_started_at(&self) -> DateTime<Utc> {
        self.round.lock().await.started_at
    }

    pub async fn pending_request(&self) -> Option<RequestId> {
        self.round.lock().await.pending_request
    }

    pub async fn info(&self) -> RaffleInfo {
        let round = self.round.lock().await;
        RaffleInfo {
            address: self.address,
            network: self.config.network.clone(),
            state: round.state,
            round: round.number,
            ticket_price: self.config.ticket_price,
            interval: self.config.interval,
            pot: round.ledger.pot(),
            player_count: round.ledger.player_count(),
            round_started_at: round.started_at,
            recent_winner: round.recent_winner,
            pending_request: round.pending_request,
        }
    }

    fn emit(&self, event: RaffleEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl RandomnessConsumer for Raffle {
    fn address(&self) -> Address {
        self.address
    }

    async fn on_randomness_fulfilled(
        &self,
        request_id: RequestId,
        random_words: Vec<u64>,
    ) -> Result<()> {
        self.finalize(request_id, random_words).await
    }
}

impl std::fmt::Debug for Raffle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raffle")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish()
    }
}

fn select_winner(snapshot: &LedgerSnapshot, random_value: u64) -> Result<(Address, Amount)> {
    let player_count = snapshot.player_count();
    if player_count == 0 {
        return Err(RaffleError::internal("Calculating round has no players"));
    }

    let index = (random_value % player_count as u64) as usize;
    Ok((snapshot.entries[index].player, snapshot.pot))
}

/// Raffle info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleInfo {
    pub address: Address,
    pub network: String,
    pub state: RaffleState,
    pub round: u64,
    pub ticket_price: Amount,
    pub interval: Duration,
    pub pot: Amount,
    pub player_count: usize,
    pub round_started_at: DateTime<Utc>,
    pub recent_winner: Option<Address>,
    pub pending_request: Option<RequestId>,
}

use crate::error::{RaffleError, Result};
use crate::types::{Address, Amount};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Moves a prize to its winner. A returned error means nothing was sent.
#[async_trait]
pub trait PayoutSink: Send + Sync {
    async fn pay(&self, to: Address, amount: Amount) -> Result<()>;
}

/// Balances kept in memory, credited by payouts
#[derive(Debug, Default)]
pub struct InMemoryBank {
    balances: RwLock<HashMap<Address, Amount>>,
    failing: AtomicBool,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: Address) -> Amount {
        self.balances
            .read()
            .get(&address)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// While set, every transfer is refused
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn total_paid(&self) -> Amount {
        self.balances
            .read()
            .values()
            .fold(Amount::ZERO, |acc, amount| acc + *amount)
    }
}

#[async_trait]
impl PayoutSink for InMemoryBank {
    async fn pay(&self, to: Address, amount: Amount) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RaffleError::payout(format!(
                "transfer of {} to {} refused",
                amount, to
            )));
        }

        let mut balances = self.balances.write();
        let balance = balances.entry(to).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| RaffleError::payout(format!("balance overflow for {}", to)))?;

        tracing::debug!("Credited {} to {}", amount, to);
        Ok(())
    }
}

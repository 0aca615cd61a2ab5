use crate::error::{RaffleError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// One paid entry into the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub player: Address,
    pub amount: Amount,
}

/// Point-in-time copy of the round's entries and pot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub entries: Vec<Entry>,
    pub pot: Amount,
}

impl LedgerSnapshot {
    pub fn players(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.player).collect()
    }

    pub fn player_count(&self) -> usize {
        self.entries.len()
    }
}

/// Entries for the live round, in the order they were recorded.
///
/// The entry index is the addressing scheme for winner selection, so the
/// sequence is append-only until the round is finalized.
#[derive(Debug, Clone)]
pub struct Ledger {
    ticket_price: Amount,
    entries: Vec<Entry>,
    pot: Amount,
}

impl Ledger {
    pub fn new(ticket_price: Amount) -> Self {
        Self {
            ticket_price,
            entries: Vec::new(),
            pot: Amount::ZERO,
        }
    }

    pub fn ticket_price(&self) -> Amount {
        self.ticket_price
    }

    /// Append an entry and accrue its full payment. Returns the entry index.
    pub fn record_entry(&mut self, player: Address, amount: Amount) -> Result<usize> {
        if amount < self.ticket_price {
            return Err(RaffleError::InsufficientPayment {
                need: self.ticket_price,
                sent: amount,
            });
        }

        let pot = self
            .pot
            .checked_add(amount)
            .ok_or_else(|| RaffleError::internal("Pot overflow"))?;

        self.entries.push(Entry { player, amount });
        self.pot = pot;
        Ok(self.entries.len() - 1)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            entries: self.entries.clone(),
            pot: self.pot,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.pot = Amount::ZERO;
    }

    pub fn player(&self, index: usize) -> Result<Address> {
        self.entries
            .get(index)
            .map(|e| e.player)
            .ok_or(RaffleError::PlayerIndexOutOfBounds {
                index,
                len: self.entries.len(),
            })
    }

    pub fn players(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.player).collect()
    }

    pub fn player_count(&self) -> usize {
        self.entries.len()
    }

    pub fn pot(&self) -> Amount {
        self.pot
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Amount {
        "0.1".parse().unwrap()
    }

    #[test]
    fn test_underpayment_leaves_ledger_untouched() {
        let mut ledger = Ledger::new(ticket());
        ledger.record_entry(Address::from_low_u64(1), ticket()).unwrap();

        for sent in [Amount::ZERO, Amount::from_units(ticket().to_units() - 1)] {
            let err = ledger
                .record_entry(Address::from_low_u64(2), sent)
                .unwrap_err();
            assert!(matches!(
                err,
                RaffleError::InsufficientPayment { need, sent: s } if need == ticket() && s == sent
            ));
        }

        assert_eq!(ledger.player_count(), 1);
        assert_eq!(ledger.pot(), ticket());
    }

    #[test]
    fn test_entries_keep_call_order() {
        let mut ledger = Ledger::new(ticket());
        let players: Vec<Address> = [5u64, 3, 9, 3].iter().map(|n| Address::from_low_u64(*n)).collect();

        for (i, p) in players.iter().enumerate() {
            assert_eq!(ledger.record_entry(*p, ticket()).unwrap(), i);
        }

        assert_eq!(ledger.players(), players);
        assert_eq!(ledger.snapshot().players(), players);
        assert_eq!(ledger.player(2).unwrap(), players[2]);
        assert!(matches!(
            ledger.player(4),
            Err(RaffleError::PlayerIndexOutOfBounds { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_overpayment_accrues_in_full() {
        let mut ledger = Ledger::new(ticket());
        let paid: Amount = "0.25".parse().unwrap();
        ledger.record_entry(Address::from_low_u64(1), paid).unwrap();
        ledger.record_entry(Address::from_low_u64(2), ticket()).unwrap();
        assert_eq!(ledger.pot().to_string(), "0.35");
    }

    #[test]
    fn test_snapshot_then_clear() {
        let mut ledger = Ledger::new(ticket());
        ledger.record_entry(Address::from_low_u64(1), ticket()).unwrap();

        let snapshot = ledger.snapshot();
        ledger.clear();

        assert_eq!(snapshot.player_count(), 1);
        assert_eq!(snapshot.pot, ticket());
        assert!(ledger.is_empty());
        assert_eq!(ledger.pot(), Amount::ZERO);
    }

    #[test]
    fn test_pot_overflow_is_rejected() {
        let mut ledger = Ledger::new(Amount::from_units(1));
        ledger
            .record_entry(Address::from_low_u64(1), Amount::from_units(u128::MAX))
            .unwrap();
        let err = ledger
            .record_entry(Address::from_low_u64(2), Amount::from_units(1))
            .unwrap_err();
        assert!(matches!(err, RaffleError::Internal(_)));
        assert_eq!(ledger.player_count(), 1);
    }
}

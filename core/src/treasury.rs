//! Push-style monetary transfer out of escrow custody.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::identity::Address;

/// Receives value pushed out of escrow custody.
///
/// Implementations must be atomic: a failed call leaves every balance
/// unchanged. `pay_all` extends that guarantee across several payouts
/// issued as one unit, which the cancellation settlement relies on.
pub trait PayoutSink {
    fn pay(&mut self, to: Address, amount: u64) -> std::result::Result<(), TransferError>;

    /// Pushes several payouts as a single all-or-nothing unit.
    fn pay_all(&mut self, payouts: &[(Address, u64)]) -> std::result::Result<(), TransferError>;
}

/// In-memory per-identity balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CashLedger {
    balances: BTreeMap<Address, u64>,
}

impl CashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, who: Address) -> u64 {
        self.balances.get(&who).copied().unwrap_or(0)
    }

    /// Adds `amount` to `who`'s balance.
    pub fn credit(&mut self, who: Address, amount: u64) -> std::result::Result<(), TransferError> {
        let balance = self.balances.entry(who).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(who))?;
        Ok(())
    }

    /// Removes `amount` from `who`'s balance.
    pub fn debit(&mut self, who: Address, amount: u64) -> std::result::Result<(), TransferError> {
        let available = self.balance_of(who);
        match available.checked_sub(amount) {
            Some(rest) => {
                self.balances.insert(who, rest);
                Ok(())
            }
            None => Err(TransferError::InsufficientBalance {
                needed: amount,
                available,
            }),
        }
    }
}

impl PayoutSink for CashLedger {
    fn pay(&mut self, to: Address, amount: u64) -> std::result::Result<(), TransferError> {
        self.credit(to, amount)
    }

    fn pay_all(&mut self, payouts: &[(Address, u64)]) -> std::result::Result<(), TransferError> {
        // Stage on a copy so a failing leg leaves nothing applied.
        let mut staged = self.clone();
        for &(to, amount) in payouts {
            staged.credit(to, amount)?;
        }
        *self = staged;
        Ok(())
    }
}

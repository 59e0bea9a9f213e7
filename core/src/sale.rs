//! Sale records and per-sale state transitions.
//!
//! Everything here is pure bookkeeping on a single [`Sale`]; caller
//! authorization and external effects live in the registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;
use crate::identity::Address;
use crate::Result;

/// Lifecycle of a sale.
///
/// `Finalized` and `Cancelled` are absorbing: once reached, the record
/// is retained unchanged except for the single withdrawal payout
/// permitted from `Cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    /// Listed by the seller; custody held by the escrow, no deposit yet.
    Listed,
    /// Good-faith deposit received; waiting on the inspector.
    AwaitingInspection,
    /// Inspection passed; waiting for the balance of the purchase price.
    AwaitingFunds,
    /// Fully funded; waiting for every required party to approve.
    AwaitingApproval,
    /// Settled: seller paid, custody with the buyer.
    Finalized,
    /// Unwound: residual funds claimable via withdrawal.
    Cancelled,
}

impl SaleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Cancelled)
    }
}

impl std::fmt::Display for SaleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Listed => "listed",
            Self::AwaitingInspection => "awaiting inspection",
            Self::AwaitingFunds => "awaiting funds",
            Self::AwaitingApproval => "awaiting approval",
            Self::Finalized => "finalized",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Parties whose approval finalization may require.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
    Lender,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Lender => "lender",
        };
        f.write_str(s)
    }
}

/// Terms fixed at listing time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleTerms {
    pub buyer: Address,
    pub inspector: Address,
    /// `None` when the buyer is self-financing.
    pub lender: Option<Address>,
    /// Amount required for full payment.
    pub purchase_price: u64,
    /// Minimum good-faith deposit gating entry into inspection.
    pub escrow_amount: u64,
}

/// One asset's sale record. Created by `list`, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sale {
    pub seller: Address,
    pub buyer: Address,
    pub inspector: Address,
    pub lender: Option<Address>,
    pub purchase_price: u64,
    pub escrow_amount: u64,
    /// Cumulative amount received from buyer or lender; zeroed only by
    /// the withdrawal payout.
    pub funds_deposited: u64,
    pub state: SaleState,
    pub inspection_passed: bool,
    /// Identities that have approved. Grows monotonically.
    pub approvals: BTreeSet<Address>,
}

impl Sale {
    /// Creates a freshly listed sale after validating the price terms.
    pub fn new(seller: Address, terms: SaleTerms) -> Result<Self> {
        if terms.purchase_price <= terms.escrow_amount {
            return Err(EscrowError::InvalidPriceTerms {
                price: terms.purchase_price,
                escrow: terms.escrow_amount,
            });
        }
        Ok(Self {
            seller,
            buyer: terms.buyer,
            inspector: terms.inspector,
            lender: terms.lender,
            purchase_price: terms.purchase_price,
            escrow_amount: terms.escrow_amount,
            funds_deposited: 0,
            state: SaleState::Listed,
            inspection_passed: false,
            approvals: BTreeSet::new(),
        })
    }

    /// True if `who` may attach funds to this sale.
    pub fn is_depositor(&self, who: Address) -> bool {
        who == self.buyer || self.lender == Some(who)
    }

    /// Credits a deposit and applies the transition rule, in order:
    /// first the escrow threshold (only out of `Listed`), then the
    /// full-price threshold. A single deposit covering the full price
    /// therefore jumps straight to `AwaitingApproval`, skipping the
    /// inspection wait state but not the inspection requirement,
    /// which finalization re-checks.
    pub fn apply_deposit(&mut self, amount: u64) -> Result<()> {
        self.funds_deposited = self
            .funds_deposited
            .checked_add(amount)
            .ok_or(EscrowError::AmountOverflow)?;

        if self.state == SaleState::Listed && self.funds_deposited >= self.escrow_amount {
            self.state = SaleState::AwaitingInspection;
        }
        if self.funds_deposited >= self.purchase_price {
            self.state = SaleState::AwaitingApproval;
        }
        Ok(())
    }

    /// Records the inspector's verdict. On pass, advances to
    /// `AwaitingApproval` if already fully funded, else to
    /// `AwaitingFunds`; on fail, cancels the sale.
    pub fn record_inspection(&mut self, passed: bool) {
        self.inspection_passed = passed;
        self.state = if !passed {
            SaleState::Cancelled
        } else if self.funds_deposited >= self.purchase_price {
            SaleState::AwaitingApproval
        } else {
            SaleState::AwaitingFunds
        };
    }

    /// Records an approval. Re-approving is a no-op; returns whether
    /// the entry was new.
    pub fn record_approval(&mut self, who: Address) -> bool {
        self.approvals.insert(who)
    }

    /// Checks every finalization precondition beyond the state itself.
    /// This is the sole safety net for sales that bypassed the
    /// inspection wait state via full early payment.
    pub fn check_finalize(&self) -> Result<()> {
        if !self.inspection_passed {
            return Err(EscrowError::InspectionNotPassed);
        }
        if self.funds_deposited < self.purchase_price {
            return Err(EscrowError::InsufficientFunds {
                held: self.funds_deposited,
                price: self.purchase_price,
            });
        }
        if !self.approvals.contains(&self.buyer) {
            return Err(EscrowError::MissingApproval(Role::Buyer));
        }
        if !self.approvals.contains(&self.seller) {
            return Err(EscrowError::MissingApproval(Role::Seller));
        }
        if let Some(lender) = self.lender {
            if !self.approvals.contains(&lender) {
                return Err(EscrowError::MissingApproval(Role::Lender));
            }
        }
        Ok(())
    }
}

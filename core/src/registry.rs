//! The escrow registry: one sale state machine per asset identifier.
//!
//! Every operation takes the verified caller identity, loads the
//! asset's [`Sale`] record, validates caller and state, mutates, and
//! emits an event. External effects go through the [`AssetRegistry`]
//! and [`PayoutSink`] collaborators; `finalize` and `withdraw` commit
//! the terminal state before issuing them and restore a pre-mutation
//! snapshot if a collaborator call fails, so the whole operation is
//! atomic from the caller's point of view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetId, AssetRegistry};
use crate::error::EscrowError;
use crate::event::Event;
use crate::identity::Address;
use crate::sale::{Sale, SaleState, SaleTerms};
use crate::treasury::PayoutSink;
use crate::Result;

/// Owns the `asset id -> Sale` map and enforces the state machine.
///
/// Records are never deleted: `Finalized` and `Cancelled` sales occupy
/// their slot forever, which also means a settled asset identifier can
/// never be re-listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscrowRegistry {
    /// The registry's own identity in the asset registry; custody of
    /// listed assets is held under this address.
    address: Address,
    sales: BTreeMap<AssetId, Sale>,
    events: Vec<Event>,
    /// Exclusive guard over `finalize`/`withdraw`; a nested mutating
    /// call while set is rejected outright.
    #[serde(skip)]
    locked: bool,
}

impl EscrowRegistry {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            sales: BTreeMap::new(),
            events: Vec::new(),
            locked: false,
        }
    }

    /// The identity under which this registry holds asset custody.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sale(&self, id: AssetId) -> Option<&Sale> {
        self.sales.get(&id)
    }

    /// Emitted events, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Lists `id` for sale: transfers custody from the caller into the
    /// registry atomically with record creation. If the custody
    /// transfer fails, no record is created.
    pub fn list(
        &mut self,
        assets: &mut impl AssetRegistry,
        caller: Address,
        id: AssetId,
        terms: SaleTerms,
    ) -> Result<()> {
        self.ensure_unlocked()?;
        if self.sales.contains_key(&id) {
            return Err(EscrowError::AlreadyListed);
        }
        if assets.owner_of(id)? != caller {
            return Err(EscrowError::NotAssetOwner);
        }
        let sale = Sale::new(caller, terms)?;
        assets.transfer_custody(id, caller, self.address)?;
        let event = Event::SaleListed {
            asset: id,
            seller: sale.seller,
            buyer: sale.buyer,
            price: sale.purchase_price,
        };
        self.sales.insert(id, sale);
        self.events.push(event);
        Ok(())
    }

    /// Credits an attached amount from the buyer or lender and applies
    /// the deposit transition rule.
    pub fn deposit_funds(&mut self, caller: Address, id: AssetId, amount: u64) -> Result<()> {
        self.ensure_unlocked()?;
        let sale = self.sale_mut(id)?;
        if !sale.is_depositor(caller) {
            return Err(EscrowError::Unauthorized("deposit"));
        }
        if !matches!(sale.state, SaleState::Listed | SaleState::AwaitingFunds) {
            return Err(EscrowError::InvalidState {
                op: "deposit",
                state: sale.state,
            });
        }
        sale.apply_deposit(amount)?;
        self.events.push(Event::FundsDeposited {
            asset: id,
            from: caller,
            amount,
        });
        Ok(())
    }

    /// Records the inspector's verdict; a failed inspection cancels
    /// the sale on the spot.
    pub fn update_inspection(&mut self, caller: Address, id: AssetId, passed: bool) -> Result<()> {
        self.ensure_unlocked()?;
        let sale = self.sale_mut(id)?;
        if caller != sale.inspector {
            return Err(EscrowError::Unauthorized("inspect"));
        }
        if sale.state != SaleState::AwaitingInspection {
            return Err(EscrowError::InvalidState {
                op: "inspect",
                state: sale.state,
            });
        }
        sale.record_inspection(passed);
        self.events.push(Event::InspectionUpdated {
            asset: id,
            inspector: caller,
            passed,
        });
        if !passed {
            self.events.push(Event::SaleCancelled { asset: id });
        }
        Ok(())
    }

    /// Records the caller's approval. Idempotent beyond re-emitting
    /// the event.
    pub fn approve_sale(&mut self, caller: Address, id: AssetId) -> Result<()> {
        self.ensure_unlocked()?;
        let sale = self.sale_mut(id)?;
        if sale.state != SaleState::AwaitingApproval {
            return Err(EscrowError::InvalidState {
                op: "approve",
                state: sale.state,
            });
        }
        if caller != sale.buyer && caller != sale.seller && sale.lender != Some(caller) {
            return Err(EscrowError::Unauthorized("approve"));
        }
        sale.record_approval(caller);
        self.events.push(Event::SaleApproved {
            asset: id,
            approver: caller,
        });
        Ok(())
    }

    /// Settles the sale: pays the seller exactly the purchase price
    /// and moves custody to the buyer, as one atomic unit. Callable by
    /// anyone once every required party has approved.
    ///
    /// Any surplus deposited above the purchase price stays with the
    /// escrow.
    pub fn finalize_sale(
        &mut self,
        assets: &mut impl AssetRegistry,
        payouts: &mut impl PayoutSink,
        id: AssetId,
    ) -> Result<()> {
        self.ensure_unlocked()?;
        self.locked = true;
        let result = self.finalize_locked(assets, payouts, id);
        self.locked = false;
        result
    }

    fn finalize_locked(
        &mut self,
        assets: &mut impl AssetRegistry,
        payouts: &mut impl PayoutSink,
        id: AssetId,
    ) -> Result<()> {
        let escrow = self.address;
        let sale = self.sale_mut(id)?;
        if sale.state != SaleState::AwaitingApproval {
            return Err(EscrowError::InvalidState {
                op: "finalize",
                state: sale.state,
            });
        }
        sale.check_finalize()?;

        let snapshot = sale.clone();
        let (buyer, seller, price) = (sale.buyer, sale.seller, sale.purchase_price);
        // Terminal state commits before any external call; a reentrant
        // caller observes Finalized and is rejected by the state checks.
        sale.state = SaleState::Finalized;

        // Custody moves first: the escrow can reverse that leg itself
        // if the payout then fails, which makes the pair compensable.
        let outcome = assets
            .transfer_custody(id, escrow, buyer)
            .and_then(|()| {
                payouts.pay(seller, price).inspect_err(|_| {
                    let _ = assets.transfer_custody(id, buyer, escrow);
                })
            });
        match outcome {
            Ok(()) => {
                self.events.push(Event::SaleFinalized {
                    asset: id,
                    buyer,
                    seller,
                    amount: price,
                });
                Ok(())
            }
            Err(e) => {
                self.restore(id, snapshot);
                Err(e.into())
            }
        }
    }

    /// Unwinds the sale from `AwaitingFunds` or `AwaitingApproval`.
    /// Not reachable from `Listed` or `AwaitingInspection` by direct
    /// call; those unwind only through a failed inspection.
    pub fn cancel_sale(&mut self, caller: Address, id: AssetId) -> Result<()> {
        self.ensure_unlocked()?;
        let sale = self.sale_mut(id)?;
        if caller != sale.buyer && caller != sale.seller {
            return Err(EscrowError::Unauthorized("cancel"));
        }
        if !matches!(
            sale.state,
            SaleState::AwaitingFunds | SaleState::AwaitingApproval
        ) {
            return Err(EscrowError::InvalidState {
                op: "cancel",
                state: sale.state,
            });
        }
        sale.state = SaleState::Cancelled;
        self.events.push(Event::SaleCancelled { asset: id });
        Ok(())
    }

    /// Settles the residual fund balance of a cancelled sale.
    ///
    /// If inspection never passed, the buyer reclaims the full
    /// deposit. If it did pass (the sale was cancelled on the approval
    /// path), the seller collects the forfeited escrow amount and the
    /// surplus above it is refunded to the buyer in the same unit.
    pub fn withdraw_funds(
        &mut self,
        payouts: &mut impl PayoutSink,
        caller: Address,
        id: AssetId,
    ) -> Result<()> {
        self.ensure_unlocked()?;
        self.locked = true;
        let result = self.withdraw_locked(payouts, caller, id);
        self.locked = false;
        result
    }

    fn withdraw_locked(
        &mut self,
        payouts: &mut impl PayoutSink,
        caller: Address,
        id: AssetId,
    ) -> Result<()> {
        let sale = self.sale_mut(id)?;
        if sale.state != SaleState::Cancelled {
            return Err(EscrowError::InvalidState {
                op: "withdraw",
                state: sale.state,
            });
        }
        if sale.funds_deposited == 0 {
            return Err(EscrowError::NothingToWithdraw);
        }

        let legs: Vec<(Address, u64)> = if !sale.inspection_passed {
            if caller != sale.buyer {
                return Err(EscrowError::Unauthorized("withdraw"));
            }
            vec![(sale.buyer, sale.funds_deposited)]
        } else {
            if caller != sale.seller {
                return Err(EscrowError::Unauthorized("withdraw"));
            }
            let refund = sale.funds_deposited.saturating_sub(sale.escrow_amount);
            let mut legs = vec![(sale.seller, sale.escrow_amount)];
            if refund > 0 {
                legs.push((sale.buyer, refund));
            }
            legs
        };

        let snapshot = sale.clone();
        // Zeroed before the payout goes out, so a repeated withdrawal
        // finds nothing to claim.
        sale.funds_deposited = 0;

        match payouts.pay_all(&legs) {
            Ok(()) => {
                for (recipient, amount) in legs {
                    self.events.push(Event::FundsWithdrawn {
                        asset: id,
                        recipient,
                        amount,
                    });
                }
                Ok(())
            }
            Err(e) => {
                self.restore(id, snapshot);
                Err(e.into())
            }
        }
    }

    fn sale_mut(&mut self, id: AssetId) -> Result<&mut Sale> {
        self.sales.get_mut(&id).ok_or(EscrowError::UnknownSale)
    }

    fn restore(&mut self, id: AssetId, snapshot: Sale) {
        if let Some(slot) = self.sales.get_mut(&id) {
            *slot = snapshot;
        }
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(EscrowError::Reentrancy);
        }
        Ok(())
    }
}

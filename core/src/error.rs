use thiserror::Error;

use crate::asset::AssetId;
use crate::identity::Address;
use crate::sale::{Role, SaleState};

/// Escrow-related errors.
#[derive(Debug, Error, PartialEq)]
pub enum EscrowError {
    /// Caller does not hold registry custody of the asset being listed.
    #[error("caller does not hold custody of the asset")]
    NotAssetOwner,

    /// A sale record (active or settled) already occupies this slot.
    #[error("a sale already exists for this asset")]
    AlreadyListed,

    #[error("purchase price must exceed escrow amount (price={price}, escrow={escrow})")]
    InvalidPriceTerms { price: u64, escrow: u64 },

    /// Caller is not one of the parties permitted to perform the operation.
    #[error("caller not authorized to {0}")]
    Unauthorized(&'static str),

    /// Operation not legal in the sale's current state.
    #[error("cannot {op} while sale is {state}")]
    InvalidState { op: &'static str, state: SaleState },

    #[error("no sale listed for this asset")]
    UnknownSale,

    #[error("inspection has not passed")]
    InspectionNotPassed,

    #[error("deposited funds do not cover the purchase price (held={held}, price={price})")]
    InsufficientFunds { held: u64, price: u64 },

    #[error("missing approval from {0}")]
    MissingApproval(Role),

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// Cumulative deposits would overflow the fund balance.
    #[error("deposit overflows fund balance")]
    AmountOverflow,

    /// Nested call into a guarded operation while one is in flight.
    #[error("reentrant call rejected")]
    Reentrancy,

    #[error("identity error: {0}")]
    Identity(IdentityError),

    #[error("transfer failed: {0}")]
    Transfer(TransferError),
}

/// Errors that might occur while parsing an [`Address`].
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 20 bytes, got {0}")]
    BadLength(usize),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,
}

/// Failures reported by the external collaborators (asset registry
/// and payout sink). Each collaborator call is atomic: on failure it
/// leaves custody and balances unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum TransferError {
    #[error("asset {0} is not registered")]
    UnknownAsset(AssetId),

    #[error("asset {0} is already registered")]
    DuplicateAsset(AssetId),

    #[error("asset {id} is not held by {from}")]
    NotCustodian { id: AssetId, from: Address },

    #[error("payout of {amount} to {to} rejected: {reason}")]
    PayoutRejected {
        to: Address,
        amount: u64,
        reason: String,
    },

    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("balance overflow crediting {0}")]
    BalanceOverflow(Address),
}

impl From<IdentityError> for EscrowError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<TransferError> for EscrowError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

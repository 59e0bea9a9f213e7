//! Registry-tracked assets and the custody collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::identity::Address;

/// Unique key of a registry-tracked asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub u64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AssetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Custody tracking for unique assets.
///
/// Implementations must be atomic: `transfer_custody` either fully
/// reassigns the holder or fails leaving custody unchanged, and an
/// asset is never held by two identities at once.
pub trait AssetRegistry {
    /// Current custodian of `id`.
    fn owner_of(&self, id: AssetId) -> std::result::Result<Address, TransferError>;

    /// Moves custody of `id` from `from` to `to`.
    fn transfer_custody(
        &mut self,
        id: AssetId,
        from: Address,
        to: Address,
    ) -> std::result::Result<(), TransferError>;
}

/// In-memory deed registry: a thin custody ledger for unique assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeedRegistry {
    holders: BTreeMap<AssetId, Address>,
}

impl DeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new asset under `owner`.
    pub fn mint(&mut self, id: AssetId, owner: Address) -> std::result::Result<(), TransferError> {
        if self.holders.contains_key(&id) {
            return Err(TransferError::DuplicateAsset(id));
        }
        self.holders.insert(id, owner);
        Ok(())
    }
}

impl AssetRegistry for DeedRegistry {
    fn owner_of(&self, id: AssetId) -> std::result::Result<Address, TransferError> {
        self.holders
            .get(&id)
            .copied()
            .ok_or(TransferError::UnknownAsset(id))
    }

    fn transfer_custody(
        &mut self,
        id: AssetId,
        from: Address,
        to: Address,
    ) -> std::result::Result<(), TransferError> {
        if self.owner_of(id)? != from {
            return Err(TransferError::NotCustodian { id, from });
        }
        self.holders.insert(id, to);
        Ok(())
    }
}

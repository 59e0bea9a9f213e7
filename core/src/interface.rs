//! Core types for JSON (de)serialization of listing requests and
//! registry snapshots.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetId, DeedRegistry};
use crate::identity::Address;
use crate::registry::EscrowRegistry;
use crate::sale::SaleTerms;
use crate::treasury::CashLedger;

/// Default path to the listing params template.
pub const LISTING_PARAMS_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../templates/listing_params.json"
);

/// Reads a JSON-encoded file from the given `path` and deserializes into type `T`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be opened, read, or parsed.
pub fn load_escrow_data<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading escrow data: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes `data` (serializable) as pretty-printed JSON to the given `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or data cannot be serialized.
pub fn save_escrow_data<P, T>(path: P, data: &T) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, data)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}

/// Wire form of a `list` request.
///
/// The all-zero address stands for "no lender" and collapses to `None`
/// in [`SaleTerms`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingParams {
    /// Which asset to list.
    pub asset: AssetId,

    /// Who will pay for and receive the asset.
    pub buyer: Address,

    /// Who attests to the asset's condition.
    pub inspector: Address,

    /// Third-party financing party, or the zero address for none.
    #[serde(default)]
    pub lender: Address,

    /// Amount required for full payment.
    pub purchase_price: u64,

    /// Minimum good-faith deposit required to enter inspection.
    pub escrow_amount: u64,
}

impl ListingParams {
    /// The listing terms with the lender sentinel resolved.
    pub fn terms(&self) -> SaleTerms {
        SaleTerms {
            buyer: self.buyer,
            inspector: self.inspector,
            lender: (!self.lender.is_zero()).then_some(self.lender),
            purchase_price: self.purchase_price,
            escrow_amount: self.escrow_amount,
        }
    }
}

/// Whole-world state persisted by the CLI between invocations: the
/// escrow registry plus the two in-memory collaborators it drives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub escrow: EscrowRegistry,
    pub deeds: DeedRegistry,
    pub ledger: CashLedger,
}

impl Snapshot {
    /// Fresh world with the escrow registered under `escrow_address`.
    pub fn new(escrow_address: Address) -> Self {
        Self {
            escrow: EscrowRegistry::new(escrow_address),
            deeds: DeedRegistry::new(),
            ledger: CashLedger::new(),
        }
    }
}

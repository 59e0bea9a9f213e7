/// Asset identifiers and the custody-registry collaborator
pub mod asset;
/// Domain events emitted on observable transitions
pub mod event;
/// Party identities and parsing
pub mod identity;
/// JSON (de)serialization of listing requests and snapshots
pub mod interface;
/// The escrow registry and its lifecycle operations
pub mod registry;
/// Sale records and per-sale state transitions
pub mod sale;
/// Push-style monetary transfer collaborator
pub mod treasury;

pub mod error;
pub use error::{EscrowError, IdentityError, TransferError};

pub use asset::{AssetId, AssetRegistry, DeedRegistry};
pub use event::Event;
pub use identity::Address;
pub use registry::EscrowRegistry;
pub use sale::{Role, Sale, SaleState, SaleTerms};
pub use treasury::{CashLedger, PayoutSink};

pub type Result<T> = std::result::Result<T, EscrowError>;

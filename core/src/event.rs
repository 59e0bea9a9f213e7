//! Domain events: the externally observable log of sale transitions.

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::identity::Address;

/// One event per externally observable transition, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SaleListed {
        asset: AssetId,
        seller: Address,
        buyer: Address,
        price: u64,
    },
    FundsDeposited {
        asset: AssetId,
        from: Address,
        amount: u64,
    },
    InspectionUpdated {
        asset: AssetId,
        inspector: Address,
        passed: bool,
    },
    SaleApproved {
        asset: AssetId,
        approver: Address,
    },
    SaleFinalized {
        asset: AssetId,
        buyer: Address,
        seller: Address,
        amount: u64,
    },
    SaleCancelled {
        asset: AssetId,
    },
    FundsWithdrawn {
        asset: AssetId,
        recipient: Address,
        amount: u64,
    },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SaleListed {
                asset,
                seller,
                buyer,
                price,
            } => write!(f, "sale listed: asset {asset}, {seller} -> {buyer}, price {price}"),
            Self::FundsDeposited {
                asset,
                from,
                amount,
            } => write!(f, "funds deposited: asset {asset}, {amount} from {from}"),
            Self::InspectionUpdated {
                asset,
                inspector,
                passed,
            } => write!(
                f,
                "inspection {}: asset {asset}, by {inspector}",
                if *passed { "passed" } else { "failed" }
            ),
            Self::SaleApproved { asset, approver } => {
                write!(f, "sale approved: asset {asset}, by {approver}")
            }
            Self::SaleFinalized {
                asset,
                buyer,
                seller,
                amount,
            } => write!(
                f,
                "sale finalized: asset {asset} to {buyer}, {amount} paid to {seller}"
            ),
            Self::SaleCancelled { asset } => write!(f, "sale cancelled: asset {asset}"),
            Self::FundsWithdrawn {
                asset,
                recipient,
                amount,
            } => write!(f, "funds withdrawn: asset {asset}, {amount} to {recipient}"),
        }
    }
}

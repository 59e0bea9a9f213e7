//! Verified caller identities.

use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

use crate::error::IdentityError;

/// A party's verified identity: a 20-byte account address.
///
/// Serialized as a hex string; parsed from hex with an optional
/// `0x` prefix.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(#[serde_as(as = "Hex")] [u8; 20]);

impl Address {
    /// The all-zero sentinel meaning "no such party" (e.g., a sale
    /// with no lender).
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the designated "no party" sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Defaults to the "no party" sentinel.
impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| IdentityError::BadLength(v.len()))?;
        Ok(Self(bytes))
    }
}

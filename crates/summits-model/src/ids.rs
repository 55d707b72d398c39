//! Identifiers for aims and flows

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_AIM_ID: AtomicU64 = AtomicU64::new(0);

/// Process-local aim identifier
///
/// Allocated when an aim enters the client, published or not. The ledger
/// knows aims only by [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AimId(pub u64);

impl AimId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_AIM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aim#{}", self.0)
    }
}

/// Ledger address, normalized to lower-case with `0x` prefix
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Hex digits without prefix
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.0[2..]
    }

    /// Full `0x…` form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ModelError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directed flow identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    /// Source aim
    pub from: AimId,
    /// Target aim
    pub into: AimId,
}

impl FlowKey {
    /// Create key
    #[inline]
    #[must_use]
    pub const fn new(from: AimId, into: AimId) -> Self {
        Self { from, into }
    }

    /// Whether `aim` is one of the endpoints
    #[inline]
    #[must_use]
    pub fn touches(&self, aim: AimId) -> bool {
        self.from == aim || self.into == aim
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.into)
    }
}

//! Permission bitmask and pending-transaction flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Per-member permissions on an aim
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Permissions: u8 {
        /// Edit title, description and other data fields
        const EDIT = 0x01;
        /// Accept flows into the aim
        const NETWORK = 0x02;
        /// Change member permissions
        const MANAGE = 0x04;
        /// Owner
        const OWNER = 0x80;
        /// Every bit, including reserved ones
        const FULL = 0xff;
    }
}

/// Independently committed part of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aspect {
    /// Publishing a local entity
    Creation,
    /// Tracked data fields
    Data,
    /// Member permissions
    Members,
    /// Token holdings
    Investment,
    /// Ownership transfer
    Transfer,
    /// Flow confirmation by the target aim
    Confirmation,
}

impl Aspect {
    /// Pending flag for this aspect
    #[inline]
    #[must_use]
    pub fn flag(self) -> Pending {
        match self {
            Self::Creation => Pending::CREATION,
            Self::Data => Pending::DATA,
            Self::Members => Pending::MEMBERS,
            Self::Investment => Pending::INVESTMENT,
            Self::Transfer => Pending::TRANSFER,
            Self::Confirmation => Pending::CONFIRMATION,
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Creation => "creation",
            Self::Data => "data",
            Self::Members => "members",
            Self::Investment => "investment",
            Self::Transfer => "transfer",
            Self::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Ledger transactions currently in flight, one bit per [`Aspect`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pending: u8 {
        /// Publishing
        const CREATION = 0x01;
        /// Data update
        const DATA = 0x02;
        /// Membership update
        const MEMBERS = 0x04;
        /// Token trade
        const INVESTMENT = 0x08;
        /// Ownership transfer
        const TRANSFER = 0x10;
        /// Flow confirmation
        const CONFIRMATION = 0x20;
    }
}

impl Pending {
    /// Mark `aspect` in flight; returns `false` if it already was
    pub fn begin(&mut self, aspect: Aspect) -> bool {
        if self.contains(aspect.flag()) {
            return false;
        }
        self.insert(aspect.flag());
        true
    }

    /// Clear `aspect`
    pub fn finish(&mut self, aspect: Aspect) {
        self.remove(aspect.flag());
    }

    /// Whether `aspect` is in flight
    #[must_use]
    pub fn is_pending(&self, aspect: Aspect) -> bool {
        self.contains(aspect.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_contains_everything() {
        assert!(Permissions::FULL.contains(Permissions::NETWORK | Permissions::OWNER));
        assert_eq!(Permissions::default(), Permissions::empty());
    }

    #[test]
    fn pending_begin_is_exclusive_per_aspect() {
        let mut pending = Pending::default();
        assert!(pending.begin(Aspect::Data));
        assert!(!pending.begin(Aspect::Data));
        assert!(pending.begin(Aspect::Members));
        pending.finish(Aspect::Data);
        assert!(!pending.is_pending(Aspect::Data));
        assert!(pending.is_pending(Aspect::Members));
    }
}

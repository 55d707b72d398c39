//! Dirty-tracked field values
//!
//! Provides [`Tracked<T>`]: a live value plus an optional origin holding the
//! last-known remote value while the live one differs from it.

use serde::{Deserialize, Serialize};

/// Field value with its uncommitted origin
///
/// # Invariants
/// - `origin.is_some()` ⇔ `value` differs from the remote value
/// - while present, `origin` holds the remote value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    value: T,
    origin: Option<T>,
}

impl<T: Clone + PartialEq> Tracked<T> {
    /// Clean value, equal to the remote one
    #[inline]
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            origin: None,
        }
    }

    /// Live value
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Remote value recorded before the first uncommitted edit
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&T> {
        self.origin.as_ref()
    }

    /// Live value differs from the remote one
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.origin.is_some()
    }

    /// Value as last known remotely
    #[inline]
    #[must_use]
    pub fn remote(&self) -> &T {
        self.origin.as_ref().unwrap_or(&self.value)
    }

    /// Live value, only if it is uncommitted
    #[inline]
    #[must_use]
    pub fn staged(&self) -> Option<&T> {
        self.origin.as_ref().map(|_| &self.value)
    }

    /// Stage an edit
    ///
    /// Setting the origin value back clears the origin. The first edit away
    /// from a clean value captures it as origin; later edits never overwrite
    /// it. Returns `false` if nothing changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.origin.as_ref() == Some(&value) {
            self.origin = None;
            self.value = value;
            return true;
        }
        if value == self.value {
            return false;
        }
        if self.origin.is_none() {
            self.origin = Some(std::mem::replace(&mut self.value, value));
        } else {
            self.value = value;
        }
        true
    }

    /// Restore the origin value, if any
    pub fn reset(&mut self) -> bool {
        match self.origin.take() {
            Some(origin) => {
                self.value = origin;
                true
            }
            None => false,
        }
    }

    /// Record that `committed` is now the remote value
    ///
    /// Clears the origin if the live value still equals `committed`;
    /// otherwise the field was edited again meanwhile and stays dirty
    /// against the new remote value.
    pub fn settle(&mut self, committed: &T) {
        if self.value == *committed {
            self.origin = None;
        } else {
            self.origin = Some(committed.clone());
        }
    }

    /// Overwrite with a freshly read remote value, dropping local edits
    pub fn hydrate(&mut self, remote: T) {
        self.value = remote;
        self.origin = None;
    }
}

//! Batched field updates
//!
//! An [`UpdateRequest`] carries every staged field of one entity so that a
//! commit costs a single ledger round trip.

use crate::color::Rgb;
use crate::effort::Effort;
use serde::{Deserialize, Serialize};

/// Field update that knows its field name
pub trait FieldUpdate {
    /// Stable field name
    fn field(&self) -> &'static str;
}

/// One aim data field with its new value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum AimUpdate {
    /// Title
    Title(String),
    /// Description text
    Description(String),
    /// Free-form status
    State(String),
    /// Effort estimate
    Effort(Effort),
    /// Display colour
    Color(Rgb),
    /// Self-retention weight
    LoopWeight(u16),
}

impl FieldUpdate for AimUpdate {
    fn field(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::State(_) => "state",
            Self::Effort(_) => "effort",
            Self::Color(_) => "color",
            Self::LoopWeight(_) => "loop_weight",
        }
    }
}

/// One flow field with its new value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FlowUpdate {
    /// Why the flow exists
    Explanation(String),
    /// Weight in `0..=65535`
    Weight(u16),
}

impl FieldUpdate for FlowUpdate {
    fn field(&self) -> &'static str {
        match self {
            Self::Explanation(_) => "explanation",
            Self::Weight(_) => "weight",
        }
    }
}

/// Ordered set of field updates for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest<U> {
    updates: Vec<U>,
}

impl<U> Default for UpdateRequest<U> {
    fn default() -> Self {
        Self {
            updates: Vec::new(),
        }
    }
}

impl<U: FieldUpdate> UpdateRequest<U> {
    /// Empty request
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update, replacing an earlier one for the same field
    pub fn push(&mut self, update: U) {
        let field = update.field();
        self.updates.retain(|u| u.field() != field);
        self.updates.push(update);
    }

    /// Builder-style [`UpdateRequest::push`]
    #[must_use]
    pub fn with(mut self, update: U) -> Self {
        self.push(update);
        self
    }

    /// Nothing to send
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Updates in order
    pub fn iter(&self) -> std::slice::Iter<'_, U> {
        self.updates.iter()
    }

    /// Field names in order
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.updates.iter().map(FieldUpdate::field).collect()
    }
}

impl<U: FieldUpdate> FromIterator<U> for UpdateRequest<U> {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        let mut request = Self::new();
        for update in iter {
            request.push(update);
        }
        request
    }
}

impl<'a, U> IntoIterator for &'a UpdateRequest<U> {
    type Item = &'a U;
    type IntoIter = std::slice::Iter<'a, U>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_update_replaces_same_field() {
        let request = UpdateRequest::new()
            .with(AimUpdate::Title("a".into()))
            .with(AimUpdate::LoopWeight(3))
            .with(AimUpdate::Title("b".into()));

        assert_eq!(request.len(), 2);
        assert_eq!(request.fields(), vec!["loop_weight", "title"]);
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&FlowUpdate::Weight(7)).unwrap();
        assert_eq!(json, r#"{"field":"weight","value":7}"#);
    }
}

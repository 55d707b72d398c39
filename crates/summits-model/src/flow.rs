//! Flows: directed, weighted edges between aims

use crate::ids::FlowKey;
use crate::permissions::Pending;
use crate::record::FlowRecord;
use crate::tracked::Tracked;
use crate::update::{FlowUpdate, UpdateRequest};
use crate::weight::DEFAULT_FLOW_WEIGHT;

/// Graph edge
#[derive(Debug, Clone)]
pub struct Flow {
    key: FlowKey,
    explanation: Tracked<String>,
    weight: Tracked<u16>,
    share: f64,
    published: bool,
    confirmed: bool,
    pending: Pending,
}

impl Flow {
    /// Local, unpublished flow with the default weight
    #[must_use]
    pub fn new(key: FlowKey) -> Self {
        Self::with_weight(key, DEFAULT_FLOW_WEIGHT)
    }

    /// Local, unpublished flow
    #[must_use]
    pub fn with_weight(key: FlowKey, weight: u16) -> Self {
        Self {
            key,
            explanation: Tracked::default(),
            weight: Tracked::new(weight),
            share: 0.0,
            published: false,
            confirmed: false,
            pending: Pending::default(),
        }
    }

    /// Published flow read from the ledger
    #[must_use]
    pub fn from_record(key: FlowKey, record: &FlowRecord) -> Self {
        let mut flow = Self::new(key);
        flow.hydrate(record);
        flow
    }

    /// Overwrite with remote values, dropping local edits
    pub fn hydrate(&mut self, record: &FlowRecord) {
        self.explanation.hydrate(record.explanation.clone());
        self.weight.hydrate(record.weight);
        self.confirmed = record.confirmed;
        self.published = true;
    }

    /// Endpoints
    #[inline]
    #[must_use]
    pub fn key(&self) -> FlowKey {
        self.key
    }

    /// Explanation text
    #[inline]
    #[must_use]
    pub fn explanation(&self) -> &str {
        self.explanation.get()
    }

    /// Weight
    #[inline]
    #[must_use]
    pub fn weight(&self) -> u16 {
        *self.weight.get()
    }

    /// Normalized weight among the target's inflows
    #[inline]
    #[must_use]
    pub fn share(&self) -> f64 {
        self.share
    }

    pub(crate) fn set_share(&mut self, share: f64) {
        self.share = share;
    }

    /// Known to the ledger
    #[inline]
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Mark published with the fields in `sent` as the ledger values
    pub fn mark_published(&mut self, sent: &UpdateRequest<FlowUpdate>) {
        self.published = true;
        self.settle(sent);
    }

    /// Confirmed by the target aim
    #[inline]
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Record the ledger's confirmation state
    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub(crate) fn apply(&mut self, update: FlowUpdate) -> bool {
        match update {
            FlowUpdate::Explanation(v) => self.explanation.set(v),
            FlowUpdate::Weight(v) => self.weight.set(v),
        }
    }

    /// Staged fields with their new values
    #[must_use]
    pub fn updates(&self) -> UpdateRequest<FlowUpdate> {
        let mut request = UpdateRequest::new();
        if let Some(v) = self.explanation.staged() {
            request.push(FlowUpdate::Explanation(v.clone()));
        }
        if let Some(v) = self.weight.staged() {
            request.push(FlowUpdate::Weight(*v));
        }
        request
    }

    /// Remote explanation, if staged
    #[must_use]
    pub fn explanation_origin(&self) -> Option<&str> {
        self.explanation.origin().map(String::as_str)
    }

    /// Remote weight, if staged
    #[must_use]
    pub fn weight_origin(&self) -> Option<u16> {
        self.weight.origin().copied()
    }

    /// Any field staged
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.explanation.is_dirty() || self.weight.is_dirty()
    }

    pub(crate) fn reset(&mut self) -> bool {
        let explanation = self.explanation.reset();
        let weight = self.weight.reset();
        explanation || weight
    }

    /// Record that `request` is now the remote state
    pub fn settle(&mut self, request: &UpdateRequest<FlowUpdate>) {
        for update in request {
            match update {
                FlowUpdate::Explanation(v) => self.explanation.settle(v),
                FlowUpdate::Weight(v) => self.weight.settle(v),
            }
        }
    }

    /// In-flight ledger transactions
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Mutable in-flight flags
    #[inline]
    pub fn pending_mut(&mut self) -> &mut Pending {
        &mut self.pending
    }
}

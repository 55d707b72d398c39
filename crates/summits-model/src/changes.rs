//! Derived view of everything not yet on the ledger

use crate::graph::Graph;
use crate::ids::{AimId, FlowKey};
use crate::permissions::Aspect;
use serde::Serialize;

/// Uncommitted state of one outgoing flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowChange {
    /// Flow
    pub key: FlowKey,
    /// Never published
    pub unpublished: bool,
    /// Has staged field edits
    pub modified: bool,
}

/// Uncommitted state of one aim and its outgoing flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AimChanges {
    /// Aim
    pub aim: AimId,
    /// Title, for listing
    pub title: String,
    /// Never published
    pub uncommitted: bool,
    /// Aspects with staged edits
    pub aspects: Vec<Aspect>,
    /// Outgoing flows that are unpublished or modified
    pub flows: Vec<FlowChange>,
}

impl AimChanges {
    /// Nothing to commit for this aim
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.uncommitted && self.aspects.is_empty() && self.flows.is_empty()
    }
}

impl Graph {
    /// Aims with anything staged or unpublished, in graph order
    #[must_use]
    pub fn changes(&self) -> Vec<AimChanges> {
        self.aims()
            .map(|aim| {
                let id = aim.id();
                let flows = aim
                    .flows_into()
                    .filter_map(|into| self.flow(FlowKey::new(id, into)).ok())
                    .filter(|flow| !flow.is_published() || flow.is_modified())
                    .map(|flow| FlowChange {
                        key: flow.key(),
                        unpublished: !flow.is_published(),
                        modified: flow.is_modified(),
                    })
                    .collect();
                AimChanges {
                    aim: id,
                    title: aim.title().to_string(),
                    uncommitted: !aim.is_published(),
                    aspects: aim.changed_aspects(),
                    flows,
                }
            })
            .filter(|changes| !changes.is_empty())
            .collect()
    }
}

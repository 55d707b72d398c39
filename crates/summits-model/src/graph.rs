//! Aim/flow graph container
//!
//! Owns every aim and flow, keeps the adjacency sets of both endpoints in
//! step with the flow table, and recomputes shares eagerly whenever an inflow
//! set or a weight changes.

use crate::aim::Aim;
use crate::error::ModelError;
use crate::flow::Flow;
use crate::ids::{Address, AimId, FlowKey};
use crate::record::AimRecord;
use crate::update::{AimUpdate, FlowUpdate, UpdateRequest};
use crate::weight::distribute;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Aims, flows and the address index
#[derive(Debug, Clone, Default)]
pub struct Graph {
    aims: IndexMap<AimId, Aim>,
    flows: IndexMap<FlowKey, Flow>,
    addresses: HashMap<Address, AimId>,
}

impl Graph {
    /// Empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an aim; an existing aim with the same id is replaced
    pub fn insert_aim(&mut self, aim: Aim) -> AimId {
        let id = aim.id();
        if let Some(address) = aim.address() {
            self.addresses.insert(address.clone(), id);
        }
        self.aims.insert(id, aim);
        self.reweigh(id);
        id
    }

    /// Aim by id
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn aim(&self, id: AimId) -> Result<&Aim, ModelError> {
        self.aims.get(&id).ok_or(ModelError::UnknownAim(id))
    }

    /// Mutable aim by id
    ///
    /// Weight fields must go through [`Graph::update_aim`] so shares stay
    /// current.
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn aim_mut(&mut self, id: AimId) -> Result<&mut Aim, ModelError> {
        self.aims.get_mut(&id).ok_or(ModelError::UnknownAim(id))
    }

    /// Whether `id` is in the graph
    #[must_use]
    pub fn contains_aim(&self, id: AimId) -> bool {
        self.aims.contains_key(&id)
    }

    /// Aim id for a ledger address
    #[must_use]
    pub fn by_address(&self, address: &Address) -> Option<AimId> {
        self.addresses.get(address).copied()
    }

    /// Aims in insertion order
    pub fn aims(&self) -> impl Iterator<Item = &Aim> {
        self.aims.values()
    }

    /// Number of aims
    #[must_use]
    pub fn aim_count(&self) -> usize {
        self.aims.len()
    }

    /// Mark `id` published at `address`, settling the data fields in `sent`
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn publish_aim(
        &mut self,
        id: AimId,
        address: Address,
        sent: &UpdateRequest<AimUpdate>,
    ) -> Result<(), ModelError> {
        let aim = self.aims.get_mut(&id).ok_or(ModelError::UnknownAim(id))?;
        aim.mark_published(address.clone(), sent);
        self.addresses.insert(address, id);
        Ok(())
    }

    /// Overwrite `id` with a ledger record
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn hydrate_aim(&mut self, id: AimId, record: &AimRecord) -> Result<(), ModelError> {
        let aim = self.aims.get_mut(&id).ok_or(ModelError::UnknownAim(id))?;
        aim.hydrate(record);
        self.addresses.insert(record.address.clone(), id);
        self.recalc_weights(id)
    }

    /// Stage an aim data edit; returns whether anything changed
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn update_aim(&mut self, id: AimId, update: AimUpdate) -> Result<bool, ModelError> {
        let weighted = matches!(update, AimUpdate::LoopWeight(_));
        let changed = self.aim_mut(id)?.apply(update);
        if changed && weighted {
            self.recalc_weights(id)?;
        }
        Ok(changed)
    }

    /// Restore staged aim data
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn reset_aim_data(&mut self, id: AimId) -> Result<(), ModelError> {
        self.aim_mut(id)?.reset_data();
        self.recalc_weights(id)
    }

    /// Remove an aim and every flow touching it
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn remove_aim(&mut self, id: AimId) -> Result<Aim, ModelError> {
        let touching: Vec<FlowKey> = self
            .flows
            .keys()
            .filter(|key| key.touches(id))
            .copied()
            .collect();
        for key in touching {
            self.remove_flow(key)?;
        }

        let aim = self
            .aims
            .shift_remove(&id)
            .ok_or(ModelError::UnknownAim(id))?;
        if let Some(address) = aim.address() {
            self.addresses.remove(address);
        }
        Ok(aim)
    }

    /// Add a flow, linking both endpoints
    ///
    /// # Errors
    /// Returns error for a self flow, a duplicate, or an unknown endpoint
    pub fn insert_flow(&mut self, flow: Flow) -> Result<(), ModelError> {
        let key = flow.key();
        if key.from == key.into {
            return Err(ModelError::SelfFlow(key.from));
        }
        if self.flows.contains_key(&key) {
            return Err(ModelError::DuplicateFlow(key));
        }
        if !self.aims.contains_key(&key.into) {
            return Err(ModelError::UnknownAim(key.into));
        }

        self.aim_mut(key.from)?.flows_into.insert(key.into);
        self.aim_mut(key.into)?.flows_from.insert(key.from);
        self.flows.insert(key, flow);
        self.reweigh(key.into);
        Ok(())
    }

    /// Flow by key
    ///
    /// # Errors
    /// Returns error if the flow is not in the graph
    pub fn flow(&self, key: FlowKey) -> Result<&Flow, ModelError> {
        self.flows.get(&key).ok_or(ModelError::UnknownFlow(key))
    }

    /// Mutable flow by key
    ///
    /// # Errors
    /// Returns error if the flow is not in the graph
    pub fn flow_mut(&mut self, key: FlowKey) -> Result<&mut Flow, ModelError> {
        self.flows.get_mut(&key).ok_or(ModelError::UnknownFlow(key))
    }

    /// Whether the flow is in the graph
    #[must_use]
    pub fn contains_flow(&self, key: FlowKey) -> bool {
        self.flows.contains_key(&key)
    }

    /// Flows in insertion order
    pub fn flows(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    /// Number of flows
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Stage a flow edit; returns whether anything changed
    ///
    /// # Errors
    /// Returns error if the flow is not in the graph
    pub fn update_flow(&mut self, key: FlowKey, update: FlowUpdate) -> Result<bool, ModelError> {
        let weighted = matches!(update, FlowUpdate::Weight(_));
        let changed = self.flow_mut(key)?.apply(update);
        if changed && weighted {
            self.recalc_weights(key.into)?;
        }
        Ok(changed)
    }

    /// Restore staged flow fields
    ///
    /// # Errors
    /// Returns error if the flow is not in the graph
    pub fn reset_flow(&mut self, key: FlowKey) -> Result<(), ModelError> {
        if self.flow_mut(key)?.reset() {
            self.recalc_weights(key.into)?;
        }
        Ok(())
    }

    /// Remove a flow, unlinking both endpoints
    ///
    /// # Errors
    /// Returns error if the flow is not in the graph
    pub fn remove_flow(&mut self, key: FlowKey) -> Result<Flow, ModelError> {
        let flow = self
            .flows
            .shift_remove(&key)
            .ok_or(ModelError::UnknownFlow(key))?;
        if let Some(from) = self.aims.get_mut(&key.from) {
            from.flows_into.shift_remove(&key.into);
        }
        if let Some(into) = self.aims.get_mut(&key.into) {
            into.flows_from.shift_remove(&key.from);
        }
        self.reweigh(key.into);
        Ok(flow)
    }

    /// Recompute the shares of every flow into `id` and its loop share
    ///
    /// # Errors
    /// Returns error if `id` is not in the graph
    pub fn recalc_weights(&mut self, id: AimId) -> Result<(), ModelError> {
        if !self.aims.contains_key(&id) {
            return Err(ModelError::UnknownAim(id));
        }
        self.reweigh(id);
        Ok(())
    }

    fn reweigh(&mut self, id: AimId) {
        let Some(aim) = self.aims.get(&id) else {
            return;
        };
        let keys: Vec<FlowKey> = aim.flows_from().map(|from| FlowKey::new(from, id)).collect();
        let weights: Vec<u16> = keys
            .iter()
            .map(|key| self.flows.get(key).map_or(0, Flow::weight))
            .collect();

        let split = distribute(aim.loop_weight(), &weights);
        for (key, share) in keys.iter().zip(split.shares) {
            if let Some(flow) = self.flows.get_mut(key) {
                flow.set_share(share);
            }
        }
        if let Some(aim) = self.aims.get_mut(&id) {
            aim.set_loop_share(split.loop_share);
        }
    }
}

//! Aim network store
//!
//! Owns the in-memory graph, stages edits optimistically and commits them to
//! the ledger one aspect at a time.
//!
//! # Commit protocol
//!
//! 1. Under the lock: check the aspect is not already in flight, collect the
//!    staged fields and set the pending flag.
//! 2. Release the lock and await the ledger.
//! 3. Under the lock again: clear the pending flag; on success settle the
//!    committed values, on failure leave the origins untouched.
//!
//! The lock is never held across an `.await`.

use crate::activity::{ActivityLog, Severity};
use crate::config::SummitsConfig;
use crate::error::{Result, StoreError};
use crate::ledger::{Ledger, LedgerError};
use crate::persist::Pins;
use futures::future::{join_all, BoxFuture};
use indexmap::IndexSet;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use summits_geometry::Vec2;
use summits_model::{
    Address, Aim, AimChanges, AimId, AimRecord, AimUpdate, Aspect, Flow, FlowKey, FlowRecord,
    FlowUpdate, Graph, ModelError, NewFlow, Permissions, Rgb, UpdateRequest,
};
use tokio::sync::watch;

/// Current selection; at most one aim or one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected
    #[default]
    None,
    /// An aim
    Aim(AimId),
    /// A flow
    Flow(FlowKey),
}

/// Flow discovered from one endpoint while the other was not loaded yet
type FlowPair = (Address, Address);

#[derive(Debug, Default)]
struct State {
    graph: Graph,
    selection: Selection,
    waiting: HashMap<Address, Vec<FlowPair>>,
}

impl State {
    fn begin_aim(&mut self, id: AimId, aspect: Aspect) -> Result<()> {
        let aim = self.graph.aim_mut(id)?;
        if aim.pending_mut().begin(aspect) {
            Ok(())
        } else {
            Err(StoreError::CommitInFlight {
                entity: id.to_string(),
                aspect,
            })
        }
    }

    fn finish_aim(&mut self, id: AimId, aspect: Aspect) -> Option<&mut Aim> {
        let aim = self.graph.aim_mut(id).ok()?;
        aim.pending_mut().finish(aspect);
        Some(aim)
    }

    fn begin_flow(&mut self, key: FlowKey, aspect: Aspect) -> Result<()> {
        let flow = self.graph.flow_mut(key)?;
        if flow.pending_mut().begin(aspect) {
            Ok(())
        } else {
            Err(StoreError::CommitInFlight {
                entity: key.to_string(),
                aspect,
            })
        }
    }

    fn finish_flow(&mut self, key: FlowKey, aspect: Aspect) -> Option<&mut Flow> {
        let flow = self.graph.flow_mut(key).ok()?;
        flow.pending_mut().finish(aspect);
        Some(flow)
    }

    fn published_address(&self, id: AimId) -> Result<Address> {
        self.graph
            .aim(id)?
            .address()
            .cloned()
            .ok_or_else(|| StoreError::NotPublished(id.to_string()))
    }

    fn flow_addresses(&self, key: FlowKey) -> Result<(Address, Address)> {
        Ok((
            self.published_address(key.from)?,
            self.published_address(key.into)?,
        ))
    }

    fn clear_selection_of_aim(&mut self, id: AimId) {
        let selected = match self.selection {
            Selection::Aim(aim) => aim == id,
            Selection::Flow(key) => key.touches(id),
            Selection::None => false,
        };
        if selected {
            self.selection = Selection::None;
        }
    }

    /// Insert or refresh a fetched aim; returns its id
    ///
    /// Aims with staged or in-flight changes keep their local state.
    fn upsert_aim(
        &mut self,
        record: &AimRecord,
        level: u32,
        anchor: Vec2,
        config: &SummitsConfig,
    ) -> Result<AimId> {
        if let Some(id) = self.graph.by_address(&record.address) {
            let aim = self.graph.aim(id)?;
            let busy = !aim.changed_aspects().is_empty() || aim.has_pending_transactions();
            if busy {
                tracing::debug!("Keeping local state of {} ({})", id, record.address);
            } else {
                self.graph.hydrate_aim(id, record)?;
            }
            let aim = self.graph.aim_mut(id)?;
            aim.load_level = aim.load_level.max(level);
            return Ok(id);
        }

        let mut aim = Aim::from_record(AimId::next(), record, config.radius_divisor);
        aim.pos = place_near(anchor, config.spawn_radius);
        aim.load_level = level;
        Ok(self.graph.insert_aim(aim))
    }

    fn park(&mut self, missing: Address, pair: FlowPair) {
        let parked = self.waiting.entry(missing).or_default();
        if !parked.contains(&pair) {
            parked.push(pair);
        }
    }

    fn flow_key(&self, from: &Address, into: &Address) -> Option<FlowKey> {
        Some(FlowKey::new(
            self.graph.by_address(from)?,
            self.graph.by_address(into)?,
        ))
    }

    fn insert_remote_flow(&mut self, record: &FlowRecord) -> Result<()> {
        let Some(key) = self.flow_key(&record.from, &record.into) else {
            tracing::debug!("Dropping flow {} -> {}: endpoint gone", record.from, record.into);
            return Ok(());
        };
        if self.graph.contains_flow(key) {
            return Ok(());
        }
        self.graph.insert_flow(Flow::from_record(key, record))?;
        Ok(())
    }
}

fn place_near(anchor: Vec2, radius: f64) -> Vec2 {
    if radius <= 0.0 {
        return anchor;
    }
    let mut rng = rand::rng();
    let angle = rng.random_range(0.0..std::f64::consts::TAU);
    let distance = radius * rng.random_range(0.0f64..1.0).sqrt();
    anchor + Vec2::new(angle.cos(), angle.sin()) * distance
}

/// Graph of aims and flows synchronized with a ledger
pub struct AimNetwork {
    ledger: Arc<dyn Ledger>,
    config: SummitsConfig,
    state: Mutex<State>,
    activity: ActivityLog,
    version: watch::Sender<u64>,
}

impl std::fmt::Debug for AimNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AimNetwork")
            .field("config", &self.config)
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl AimNetwork {
    /// Create an empty store over `ledger`
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>, config: SummitsConfig) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            ledger,
            config,
            state: Mutex::new(State::default()),
            activity: ActivityLog::new(),
            version,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SummitsConfig {
        &self.config
    }

    /// Transaction outcomes
    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Receiver notified with a new version after every mutation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Number of mutations so far
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Run `f` against the current graph
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.state.lock().graph)
    }

    /// Copy of an aim
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn aim(&self, id: AimId) -> Result<Aim> {
        Ok(self.state.lock().graph.aim(id)?.clone())
    }

    /// Copy of a flow
    ///
    /// # Errors
    /// Returns error if the flow is unknown
    pub fn flow(&self, key: FlowKey) -> Result<Flow> {
        Ok(self.state.lock().graph.flow(key)?.clone())
    }

    /// Id of the loaded aim at `address`
    #[must_use]
    pub fn aim_id(&self, address: &Address) -> Option<AimId> {
        self.state.lock().graph.by_address(address)
    }

    /// Everything not yet committed
    #[must_use]
    pub fn changes(&self) -> Vec<AimChanges> {
        self.state.lock().graph.changes()
    }

    fn conclude<T>(
        &self,
        result: std::result::Result<T, LedgerError>,
        what: impl FnOnce() -> String,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.activity.record(Severity::Info, what());
                Ok(value)
            }
            Err(e) => {
                self.activity
                    .record(Severity::Error, format!("{} failed: {e}", what()));
                Err(e.into())
            }
        }
    }

    // ---- aims -------------------------------------------------------------

    /// Create a local, unpublished aim
    ///
    /// `modify` runs before the aim enters the graph.
    pub fn create_aim(&self, modify: impl FnOnce(&mut Aim)) -> AimId {
        let mut aim = Aim::new(AimId::next(), self.config.radius_divisor)
            .with_loop_weight(self.config.default_loop_weight);
        aim.pos = place_near(Vec2::ZERO, self.config.spawn_radius);
        modify(&mut aim);

        let id = self.state.lock().graph.insert_aim(aim);
        tracing::debug!("Created local aim {}", id);
        self.bump();
        id
    }

    /// Create a local aim with full permissions and neutral colour, and select it
    pub fn create_and_select_aim(&self, modify: impl FnOnce(&mut Aim)) -> AimId {
        let id = self.create_aim(|aim| {
            aim.permissions = Permissions::FULL;
            aim.apply(AimUpdate::Color(Rgb::NEUTRAL));
            modify(aim);
        });
        self.state.lock().selection = Selection::Aim(id);
        self.bump();
        id
    }

    /// Publish a local aim; returns its address
    ///
    /// Already published aims return their address without a ledger call.
    ///
    /// # Errors
    /// Returns error if the aim is unknown, creation is in flight, or the
    /// ledger fails
    pub async fn publish_aim(&self, id: AimId) -> Result<Address> {
        let (new_aim, sent) = {
            let mut state = self.state.lock();
            if let Some(address) = state.graph.aim(id)?.address() {
                return Ok(address.clone());
            }
            state.begin_aim(id, Aspect::Creation)?;
            let aim = state.graph.aim(id)?;
            (aim.new_aim(), aim.data_updates())
        };
        self.bump();

        let result = self.ledger.create_aim(new_aim).await;
        {
            let mut state = self.state.lock();
            state.finish_aim(id, Aspect::Creation);
            if let Ok(address) = &result {
                if state.graph.contains_aim(id) {
                    state.graph.publish_aim(id, address.clone(), &sent)?;
                }
            }
        }
        self.bump();
        self.conclude(result, || format!("Publishing {id}"))
    }

    /// Load the ledger's home aim and `level` rings of neighbours
    ///
    /// # Errors
    /// Returns error if the home aim cannot be read
    pub async fn load_home(&self, level: u32) -> Result<AimId> {
        tracing::info!("Loading home aim");
        let base = match self.ledger.base_aim().await {
            Ok(address) => address,
            Err(e) => {
                self.activity
                    .record(Severity::Error, format!("Loading home aim failed: {e}"));
                return Err(e.into());
            }
        };
        self.load_aim(&base, level).await
    }

    /// Load every pinned aim
    ///
    /// Failures are logged; the ids of the aims that loaded are returned.
    pub async fn load_pinned(&self, pins: &Pins, level: u32) -> Vec<AimId> {
        let loads = pins
            .iter()
            .map(|address| self.load_from(address.clone(), level, Vec2::ZERO));
        join_all(loads)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Pinned aim failed to load: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Fetch the aim at `address` and attach its flows
    ///
    /// Flows whose other endpoint is not loaded yet wait until it is. With
    /// `level > 0` the neighbours are loaded concurrently at `level - 1`.
    ///
    /// # Errors
    /// Returns error if the aim itself cannot be read; neighbour failures are
    /// only logged
    pub async fn load_aim(&self, address: &Address, level: u32) -> Result<AimId> {
        self.load_from(address.clone(), level, Vec2::ZERO).await
    }

    fn load_from(&self, address: Address, level: u32, anchor: Vec2) -> BoxFuture<'_, Result<AimId>> {
        Box::pin(async move {
            tracing::debug!("Loading aim {} at level {}", address, level);
            let record = match self.ledger.fetch_aim(&address).await {
                Ok(record) => record,
                Err(e) => {
                    self.activity
                        .record(Severity::Error, format!("Loading aim {address} failed: {e}"));
                    return Err(e.into());
                }
            };

            let (id, pos, pairs, neighbours) = {
                let mut state = self.state.lock();
                let id = state.upsert_aim(&record, level, anchor, &self.config)?;
                let pos = state.graph.aim(id)?.pos;

                let mut pairs: IndexSet<FlowPair> = IndexSet::new();
                let adjacent = record
                    .inflows
                    .iter()
                    .map(|from| (from.clone(), (from.clone(), address.clone())))
                    .chain(
                        record
                            .outflows
                            .iter()
                            .map(|into| (into.clone(), (address.clone(), into.clone()))),
                    );
                for (other, pair) in adjacent {
                    if state.graph.by_address(&other).is_some() {
                        pairs.insert(pair);
                    } else {
                        state.park(other, pair);
                    }
                }
                if let Some(parked) = state.waiting.remove(&address) {
                    pairs.extend(parked);
                }
                pairs.retain(|(from, into)| {
                    state
                        .flow_key(from, into)
                        .is_some_and(|key| !state.graph.contains_flow(key))
                });

                let neighbours: IndexSet<Address> = if level == 0 {
                    IndexSet::new()
                } else {
                    record
                        .neighbours()
                        .filter(|n| {
                            state.graph.by_address(n).map_or(true, |other| {
                                state
                                    .graph
                                    .aim(other)
                                    .is_ok_and(|aim| aim.load_level < level - 1)
                            })
                        })
                        .cloned()
                        .collect()
                };
                (id, pos, pairs, neighbours)
            };
            self.bump();

            let fetched =
                join_all(pairs.iter().map(|(from, into)| self.ledger.fetch_flow(from, into))).await;
            {
                let mut state = self.state.lock();
                for ((from, into), result) in pairs.iter().zip(fetched) {
                    let inserted = result
                        .map_err(StoreError::from)
                        .and_then(|record| state.insert_remote_flow(&record));
                    if let Err(e) = inserted {
                        tracing::warn!("Flow {} -> {} not attached: {}", from, into, e);
                    }
                }
            }
            self.bump();

            if !neighbours.is_empty() {
                let loads = neighbours
                    .into_iter()
                    .map(|n| self.load_from(n, level - 1, pos));
                for result in join_all(loads).await {
                    if let Err(e) = result {
                        tracing::warn!("Neighbour of {} failed to load: {}", address, e);
                    }
                }
            }
            Ok(id)
        })
    }

    /// Move an aim on the map
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn move_aim(&self, id: AimId, pos: Vec2) -> Result<()> {
        self.state.lock().graph.aim_mut(id)?.pos = pos;
        self.bump();
        Ok(())
    }

    /// Stage a data field edit; returns whether anything changed
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn update_aim(&self, id: AimId, update: AimUpdate) -> Result<bool> {
        let changed = self.state.lock().graph.update_aim(id, update)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Commit staged data fields in one ledger call
    ///
    /// Unpublished aims and aims without staged data are left alone.
    ///
    /// # Errors
    /// Returns error if the aim's creation or a data commit is in flight, or
    /// the ledger fails
    pub async fn commit_aim_changes(&self, id: AimId) -> Result<()> {
        let (address, request) = {
            let mut state = self.state.lock();
            let aim = state.graph.aim(id)?;
            for aspect in [Aspect::Creation, Aspect::Data] {
                if aim.pending().is_pending(aspect) {
                    return Err(StoreError::CommitInFlight {
                        entity: id.to_string(),
                        aspect,
                    });
                }
            }
            let Some(address) = aim.address().cloned() else {
                tracing::debug!("{} is unpublished; data goes out on publish", id);
                return Ok(());
            };
            let request = aim.data_updates();
            if request.is_empty() {
                return Ok(());
            }
            state.begin_aim(id, Aspect::Data)?;
            (address, request)
        };
        self.bump();
        tracing::info!("Committing {:?} of {}", request.fields(), id);

        let result = self.ledger.update_aim(&address, request.clone()).await;
        if let Some(aim) = self.state.lock().finish_aim(id, Aspect::Data) {
            if result.is_ok() {
                aim.settle_data(&request);
            }
        }
        self.bump();
        self.conclude(result, || format!("Committing data of {id}"))
    }

    /// Discard staged data fields
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn reset_aim_changes(&self, id: AimId) -> Result<()> {
        self.state.lock().graph.reset_aim_data(id)?;
        self.bump();
        Ok(())
    }

    /// Stage a token holding; the radius follows immediately
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn set_tokens(&self, id: AimId, tokens: u128) -> Result<bool> {
        let changed = self.state.lock().graph.aim_mut(id)?.set_tokens(tokens);
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Trade the difference between staged and remote holdings
    ///
    /// # Errors
    /// Returns error if the aim is unpublished, a trade is in flight, or the
    /// ledger fails
    pub async fn commit_token_changes(&self, id: AimId) -> Result<()> {
        let (address, trade) = {
            let mut state = self.state.lock();
            let address = state.published_address(id)?;
            let Some(trade) = state.graph.aim(id)?.token_trade() else {
                return Ok(());
            };
            state.begin_aim(id, Aspect::Investment)?;
            (address, trade)
        };
        self.bump();

        let result = self.ledger.trade_tokens(&address, trade).await;
        if let Some(aim) = self.state.lock().finish_aim(id, Aspect::Investment) {
            if result.is_ok() {
                aim.settle_trade(trade);
            }
        }
        self.bump();
        self.conclude(result, || format!("Trading {trade:?} of {id}"))
    }

    /// Discard a staged token holding
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn reset_token_changes(&self, id: AimId) -> Result<()> {
        self.state.lock().graph.aim_mut(id)?.reset_tokens();
        self.bump();
        Ok(())
    }

    /// Stage permissions for a member
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn set_member_permissions(
        &self,
        id: AimId,
        member: Address,
        permissions: Permissions,
    ) -> Result<bool> {
        let changed = self
            .state
            .lock()
            .graph
            .aim_mut(id)?
            .set_member_permissions(member, permissions);
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Commit staged member permissions in one ledger call
    ///
    /// # Errors
    /// Returns error if the aim is unpublished, a membership commit is in
    /// flight, or the ledger fails
    pub async fn commit_member_changes(&self, id: AimId) -> Result<()> {
        let (address, updates) = {
            let mut state = self.state.lock();
            let address = state.published_address(id)?;
            let updates = state.graph.aim(id)?.member_updates();
            if updates.is_empty() {
                return Ok(());
            }
            state.begin_aim(id, Aspect::Members)?;
            (address, updates)
        };
        self.bump();

        let result = self.ledger.update_members(&address, updates.clone()).await;
        if let Some(aim) = self.state.lock().finish_aim(id, Aspect::Members) {
            if result.is_ok() {
                aim.settle_members(&updates);
            }
        }
        self.bump();
        self.conclude(result, || {
            format!("Updating {} member(s) of {id}", updates.len())
        })
    }

    /// Discard staged member permissions
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn reset_member_changes(&self, id: AimId) -> Result<()> {
        self.state.lock().graph.aim_mut(id)?.reset_members();
        self.bump();
        Ok(())
    }

    /// Hand the aim over to `to`; the local `OWNER` bit goes on success
    ///
    /// # Errors
    /// Returns error without `OWNER` permission, for unpublished aims, while a
    /// transfer is in flight, or if the ledger fails
    pub async fn transfer_aim(&self, id: AimId, to: Address) -> Result<()> {
        let address = {
            let mut state = self.state.lock();
            let address = state.published_address(id)?;
            if !state.graph.aim(id)?.permissions.contains(Permissions::OWNER) {
                return Err(StoreError::PermissionDenied(format!("not the owner of {id}")));
            }
            state.begin_aim(id, Aspect::Transfer)?;
            address
        };
        self.bump();

        let result = self.ledger.transfer_aim(&address, &to).await;
        if let Some(aim) = self.state.lock().finish_aim(id, Aspect::Transfer) {
            if result.is_ok() {
                aim.permissions.remove(Permissions::OWNER);
            }
        }
        self.bump();
        self.conclude(result, || format!("Transferring {id} to {to}"))
    }

    /// Remove an aim and its flows from the local graph
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn remove_aim(&self, id: AimId) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.graph.remove_aim(id)?;
            state.clear_selection_of_aim(id);
        }
        self.bump();
        Ok(())
    }

    // ---- flows ------------------------------------------------------------

    /// Create a local flow with the default weight
    ///
    /// # Errors
    /// Returns error for self flows, without `NETWORK` permission on `into`,
    /// or if the flow exists
    pub fn create_flow(&self, from: AimId, into: AimId) -> Result<FlowKey> {
        let key = FlowKey::new(from, into);
        {
            let mut state = self.state.lock();
            if from == into {
                return Err(ModelError::SelfFlow(from).into());
            }
            state.graph.aim(from)?;
            if !state.graph.aim(into)?.permissions.contains(Permissions::NETWORK) {
                return Err(StoreError::PermissionDenied(format!(
                    "no network permission on {into}"
                )));
            }
            state
                .graph
                .insert_flow(Flow::with_weight(key, self.config.default_flow_weight))?;
        }
        tracing::debug!("Created local flow {}", key);
        self.bump();
        Ok(key)
    }

    /// Create a local flow and select it
    ///
    /// # Errors
    /// Same as [`AimNetwork::create_flow`]
    pub fn create_and_select_flow(&self, from: AimId, into: AimId) -> Result<FlowKey> {
        let key = self.create_flow(from, into)?;
        self.state.lock().selection = Selection::Flow(key);
        self.bump();
        Ok(key)
    }

    /// Publish a local flow between two published aims
    ///
    /// # Errors
    /// Returns error if an endpoint is unpublished, creation is in flight, or
    /// the ledger fails
    pub async fn publish_flow(&self, key: FlowKey) -> Result<()> {
        let (new_flow, sent) = {
            let mut state = self.state.lock();
            let flow = state.graph.flow(key)?;
            if flow.is_published() {
                return Ok(());
            }
            let (explanation, weight) = (flow.explanation().to_string(), flow.weight());
            let sent = UpdateRequest::new()
                .with(FlowUpdate::Explanation(explanation.clone()))
                .with(FlowUpdate::Weight(weight));
            let (from, into) = state.flow_addresses(key)?;
            state.begin_flow(key, Aspect::Creation)?;
            let new_flow = NewFlow {
                from,
                into,
                explanation,
                weight,
            };
            (new_flow, sent)
        };
        self.bump();

        let result = self.ledger.create_flow(new_flow).await;
        if let Some(flow) = self.state.lock().finish_flow(key, Aspect::Creation) {
            if result.is_ok() {
                flow.mark_published(&sent);
            }
        }
        self.bump();
        self.conclude(result, || format!("Publishing flow {key}"))
    }

    /// Stage a flow edit; weights are clamped by type and shares follow
    ///
    /// # Errors
    /// Returns error if the flow is unknown
    pub fn update_flow(&self, key: FlowKey, update: FlowUpdate) -> Result<bool> {
        let changed = self.state.lock().graph.update_flow(key, update)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Commit staged flow fields in one ledger call
    ///
    /// Unpublished flows are left alone; their fields go out on publish.
    ///
    /// # Errors
    /// Returns error if the flow's creation or a commit is in flight, or the
    /// ledger fails
    pub async fn commit_flow_changes(&self, key: FlowKey) -> Result<()> {
        let (from, into, request) = {
            let mut state = self.state.lock();
            let flow = state.graph.flow(key)?;
            for aspect in [Aspect::Creation, Aspect::Data] {
                if flow.pending().is_pending(aspect) {
                    return Err(StoreError::CommitInFlight {
                        entity: key.to_string(),
                        aspect,
                    });
                }
            }
            if !flow.is_published() {
                return Ok(());
            }
            let request = flow.updates();
            if request.is_empty() {
                return Ok(());
            }
            let (from, into) = state.flow_addresses(key)?;
            state.begin_flow(key, Aspect::Data)?;
            (from, into, request)
        };
        self.bump();

        let result = self.ledger.update_flow(&from, &into, request.clone()).await;
        if let Some(flow) = self.state.lock().finish_flow(key, Aspect::Data) {
            if result.is_ok() {
                flow.settle(&request);
            }
        }
        self.bump();
        self.conclude(result, || format!("Committing flow {key}"))
    }

    /// Discard staged flow fields
    ///
    /// # Errors
    /// Returns error if the flow is unknown
    pub fn reset_flow_changes(&self, key: FlowKey) -> Result<()> {
        self.state.lock().graph.reset_flow(key)?;
        self.bump();
        Ok(())
    }

    /// Confirm or withdraw confirmation of a published flow
    ///
    /// # Errors
    /// Returns error if the flow is unpublished, a confirmation is in flight,
    /// or the ledger fails
    pub async fn set_flow_confirmation(&self, key: FlowKey, confirmed: bool) -> Result<()> {
        let (from, into) = {
            let mut state = self.state.lock();
            if !state.graph.flow(key)?.is_published() {
                return Err(StoreError::NotPublished(key.to_string()));
            }
            let addresses = state.flow_addresses(key)?;
            state.begin_flow(key, Aspect::Confirmation)?;
            addresses
        };
        self.bump();

        let result = self
            .ledger
            .set_flow_confirmation(&from, &into, confirmed)
            .await;
        if let Some(flow) = self.state.lock().finish_flow(key, Aspect::Confirmation) {
            if result.is_ok() {
                flow.set_confirmed(confirmed);
            }
        }
        self.bump();
        self.conclude(result, || {
            let verb = if confirmed { "Confirming" } else { "Withdrawing" };
            format!("{verb} flow {key}")
        })
    }

    /// Remove a flow from the local graph
    ///
    /// # Errors
    /// Returns error if the flow is unknown
    pub fn remove_flow(&self, key: FlowKey) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.graph.remove_flow(key)?;
            if state.selection == Selection::Flow(key) {
                state.selection = Selection::None;
            }
        }
        self.bump();
        Ok(())
    }

    /// Recompute the shares of every flow into `id`
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn recalc_weights(&self, id: AimId) -> Result<()> {
        self.state.lock().graph.recalc_weights(id)?;
        self.bump();
        Ok(())
    }

    // ---- selection --------------------------------------------------------

    /// Current selection
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.state.lock().selection
    }

    /// Select an aim, deselecting any flow
    ///
    /// # Errors
    /// Returns error if `id` is unknown
    pub fn select_aim(&self, id: AimId) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.graph.aim(id)?;
            state.selection = Selection::Aim(id);
        }
        self.bump();
        Ok(())
    }

    /// Select a flow, deselecting any aim
    ///
    /// # Errors
    /// Returns error if the flow is unknown
    pub fn select_flow(&self, key: FlowKey) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.graph.flow(key)?;
            state.selection = Selection::Flow(key);
        }
        self.bump();
        Ok(())
    }

    /// Clear the selection
    pub fn deselect(&self) {
        self.state.lock().selection = Selection::None;
        self.bump();
    }

    /// Addresses of aims referenced by a loaded aim but not loaded themselves
    #[must_use]
    pub fn waiting_for(&self) -> Vec<Address> {
        self.state.lock().waiting.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    fn network() -> AimNetwork {
        let ledger = Arc::new(MemoryLedger::new("0xacc".parse().unwrap()));
        AimNetwork::new(ledger, SummitsConfig::default())
    }

    #[test]
    fn create_and_select_aim_defaults() {
        let net = network();
        let id = net.create_and_select_aim(|aim| {
            aim.apply(AimUpdate::Title("summit".into()));
        });
        let aim = net.aim(id).unwrap();
        assert_eq!(aim.permissions, Permissions::FULL);
        assert_eq!(aim.color(), Rgb::NEUTRAL);
        assert_eq!(aim.title(), "summit");
        assert!(!aim.is_published());
        assert_eq!(net.selection(), Selection::Aim(id));
    }

    #[test]
    fn selection_is_exclusive() {
        let net = network();
        let a = net.create_and_select_aim(|_| {});
        let b = net.create_and_select_aim(|_| {});
        let key = net.create_and_select_flow(a, b).unwrap();
        assert_eq!(net.selection(), Selection::Flow(key));
        net.select_aim(a).unwrap();
        assert_eq!(net.selection(), Selection::Aim(a));
        net.deselect();
        assert_eq!(net.selection(), Selection::None);
    }

    #[test]
    fn flow_needs_network_permission_on_target() {
        let net = network();
        let a = net.create_aim(|_| {});
        let b = net.create_aim(|_| {});
        let err = net.create_flow(a, b).unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));

        let err = net.create_flow(a, a).unwrap_err();
        assert!(matches!(err, StoreError::Model(ModelError::SelfFlow(_))));
    }

    #[test]
    fn removing_aim_clears_touching_selection() {
        let net = network();
        let a = net.create_and_select_aim(|_| {});
        let b = net.create_and_select_aim(|_| {});
        let key = net.create_and_select_flow(a, b).unwrap();
        net.remove_aim(a).unwrap();
        assert_eq!(net.selection(), Selection::None);
        assert!(net.flow(key).is_err());
    }

    #[test]
    fn mutations_bump_version() {
        let net = network();
        let rx = net.subscribe();
        let before = net.version();
        let id = net.create_aim(|_| {});
        net.update_aim(id, AimUpdate::Title("x".into())).unwrap();
        assert!(net.version() >= before + 2);
        assert_eq!(*rx.borrow(), net.version());

        let v = net.version();
        assert!(!net.update_aim(id, AimUpdate::Title("x".into())).unwrap());
        assert_eq!(net.version(), v);
    }

    #[tokio::test]
    async fn publish_then_commit_data() {
        let net = network();
        let id = net.create_and_select_aim(|aim| {
            aim.apply(AimUpdate::Title("draft".into()));
        });
        let address = net.publish_aim(id).await.unwrap();
        assert!(net.changes().is_empty());
        assert_eq!(net.aim_id(&address), Some(id));

        net.update_aim(id, AimUpdate::Description("more".into())).unwrap();
        net.commit_aim_changes(id).await.unwrap();
        assert!(net.changes().is_empty());
        assert_eq!(net.activity().len(), 2);
    }

    #[tokio::test]
    async fn unpublished_flow_commit_is_noop() {
        let net = network();
        let a = net.create_and_select_aim(|_| {});
        let b = net.create_and_select_aim(|_| {});
        let key = net.create_flow(a, b).unwrap();
        net.update_flow(key, FlowUpdate::Weight(1)).unwrap();
        net.commit_flow_changes(key).await.unwrap();
        assert_eq!(
            net.flow(key).unwrap().weight_origin(),
            Some(summits_model::DEFAULT_FLOW_WEIGHT)
        );
        assert!(net.activity().is_empty());
    }
}

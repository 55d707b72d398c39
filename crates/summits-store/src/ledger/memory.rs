//! In-process ledger
//!
//! Holds aims and flows in memory and enforces the same permission rules a
//! deployed contract would, from the point of view of a single account.

use super::{Ledger, LedgerError};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use summits_model::{
    Address, AimRecord, AimUpdate, FlowRecord, FlowUpdate, NewAim, NewFlow, Permissions,
    TokenTrade, UpdateRequest,
};

/// Serializable ledger content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Connected account
    #[serde(default)]
    pub account: Option<Address>,
    /// Home aim
    #[serde(default)]
    pub base: Option<Address>,
    /// Aims
    #[serde(default)]
    pub aims: Vec<AimRecord>,
    /// Flows
    #[serde(default)]
    pub flows: Vec<FlowRecord>,
}

impl LedgerSnapshot {
    /// Parse a JSON snapshot
    ///
    /// # Errors
    /// Returns error if `json` is not a valid snapshot
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Default)]
struct State {
    base: Option<Address>,
    aims: IndexMap<Address, AimRecord>,
    flows: IndexMap<(Address, Address), FlowRecord>,
    minted: u64,
}

impl State {
    fn aim(&self, address: &Address) -> Result<&AimRecord, LedgerError> {
        self.aims
            .get(address)
            .ok_or_else(|| LedgerError::NotFound(address.to_string()))
    }

    fn aim_mut(&mut self, address: &Address) -> Result<&mut AimRecord, LedgerError> {
        self.aims
            .get_mut(address)
            .ok_or_else(|| LedgerError::NotFound(address.to_string()))
    }

    fn flow_mut(&mut self, from: &Address, into: &Address) -> Result<&mut FlowRecord, LedgerError> {
        self.flows
            .get_mut(&(from.clone(), into.clone()))
            .ok_or_else(|| LedgerError::NotFound(format!("{from} -> {into}")))
    }

    fn require(&self, address: &Address, needed: Permissions) -> Result<(), LedgerError> {
        if self.aim(address)?.permissions.contains(needed) {
            Ok(())
        } else {
            Err(LedgerError::Rejected(format!(
                "missing {needed:?} permission on {address}"
            )))
        }
    }

    fn mint_address(&mut self) -> Result<Address, LedgerError> {
        loop {
            self.minted += 1;
            let address = format!("0x{:040x}", self.minted)
                .parse::<Address>()
                .map_err(|e| LedgerError::Provider(e.to_string()))?;
            if !self.aims.contains_key(&address) {
                return Ok(address);
            }
        }
    }

    fn with_adjacency(&self, record: &AimRecord) -> AimRecord {
        let mut record = record.clone();
        record.inflows = self
            .flows
            .keys()
            .filter(|(_, into)| *into == record.address)
            .map(|(from, _)| from.clone())
            .collect();
        record.outflows = self
            .flows
            .keys()
            .filter(|(from, _)| *from == record.address)
            .map(|(_, into)| into.clone())
            .collect();
        record
    }
}

/// Ledger kept in memory
#[derive(Debug)]
pub struct MemoryLedger {
    account: Address,
    state: Mutex<State>,
}

impl MemoryLedger {
    /// Empty ledger acting as `account`
    #[must_use]
    pub fn new(account: Address) -> Self {
        Self {
            account,
            state: Mutex::new(State::default()),
        }
    }

    /// Ledger populated from a snapshot
    ///
    /// Without an account in the snapshot, `fallback_account` is used.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot, fallback_account: Address) -> Self {
        let ledger = Self::new(snapshot.account.unwrap_or(fallback_account));
        {
            let mut state = ledger.state.lock();
            state.base = snapshot.base;
            for aim in snapshot.aims {
                state.aims.insert(aim.address.clone(), aim);
            }
            for flow in snapshot.flows {
                state.flows.insert((flow.from.clone(), flow.into.clone()), flow);
            }
        }
        ledger
    }

    /// Current content
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock();
        LedgerSnapshot {
            account: Some(self.account.clone()),
            base: state.base.clone(),
            aims: state.aims.values().map(|a| state.with_adjacency(a)).collect(),
            flows: state.flows.values().cloned().collect(),
        }
    }

    /// Connected account
    #[must_use]
    pub fn account(&self) -> &Address {
        &self.account
    }

    /// Set the home aim
    pub fn set_base(&self, address: Address) {
        self.state.lock().base = Some(address);
    }

    /// Insert or replace an aim record directly
    pub fn insert_aim(&self, record: AimRecord) {
        self.state.lock().aims.insert(record.address.clone(), record);
    }

    /// Insert or replace a flow record directly
    pub fn insert_flow(&self, record: FlowRecord) {
        self.state
            .lock()
            .flows
            .insert((record.from.clone(), record.into.clone()), record);
    }
}

fn apply_aim_update(record: &mut AimRecord, update: &AimUpdate) {
    match update {
        AimUpdate::Title(v) => record.title.clone_from(v),
        AimUpdate::Description(v) => record.description.clone_from(v),
        AimUpdate::State(v) => record.state.clone_from(v),
        AimUpdate::Effort(v) => record.effort = *v,
        AimUpdate::Color(v) => record.color = *v,
        AimUpdate::LoopWeight(v) => record.loop_weight = *v,
    }
}

fn set_member(record: &mut AimRecord, member: &Address, permissions: Permissions) {
    record.members.retain(|(m, _)| m != member);
    if !permissions.is_empty() {
        record.members.push((member.clone(), permissions));
    }
}

#[async_trait::async_trait]
impl Ledger for MemoryLedger {
    async fn base_aim(&self) -> Result<Address, LedgerError> {
        self.state
            .lock()
            .base
            .clone()
            .ok_or_else(|| LedgerError::NotFound("base aim".to_string()))
    }

    async fn fetch_aim(&self, address: &Address) -> Result<AimRecord, LedgerError> {
        let state = self.state.lock();
        let record = state.aim(address)?;
        Ok(state.with_adjacency(record))
    }

    async fn fetch_flow(&self, from: &Address, into: &Address) -> Result<FlowRecord, LedgerError> {
        self.state
            .lock()
            .flows
            .get(&(from.clone(), into.clone()))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("{from} -> {into}")))
    }

    async fn create_aim(&self, aim: NewAim) -> Result<Address, LedgerError> {
        let mut state = self.state.lock();
        let address = state.mint_address()?;

        let mut record = AimRecord::new(address.clone(), aim.title);
        record.description = aim.description;
        record.state = aim.state;
        record.effort = aim.effort;
        record.color = aim.color;
        record.loop_weight = aim.loop_weight;
        record.token_name = aim.token_name;
        record.token_symbol = aim.token_symbol;
        record.permissions = Permissions::FULL;
        record.members.push((self.account.clone(), Permissions::FULL));

        state.aims.insert(address.clone(), record);
        if state.base.is_none() {
            state.base = Some(address.clone());
        }
        tracing::debug!("minted aim {}", address);
        Ok(address)
    }

    async fn update_aim(
        &self,
        address: &Address,
        request: UpdateRequest<AimUpdate>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.require(address, Permissions::EDIT)?;
        let record = state.aim_mut(address)?;
        for update in &request {
            apply_aim_update(record, update);
        }
        Ok(())
    }

    async fn trade_tokens(&self, address: &Address, trade: TokenTrade) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        let record = state.aim_mut(address)?;
        match trade {
            TokenTrade::Buy(n) => {
                record.tokens = record.tokens.saturating_add(n);
                record.total_supply = record.total_supply.saturating_add(n);
            }
            TokenTrade::Sell(n) => {
                if record.tokens < n {
                    return Err(LedgerError::Rejected(format!(
                        "cannot sell {n} tokens, holding {}",
                        record.tokens
                    )));
                }
                record.tokens -= n;
                record.total_supply = record.total_supply.saturating_sub(n);
            }
        }
        Ok(())
    }

    async fn update_members(
        &self,
        address: &Address,
        members: Vec<(Address, Permissions)>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.require(address, Permissions::MANAGE)?;
        let account = self.account.clone();
        let record = state.aim_mut(address)?;
        for (member, permissions) in &members {
            set_member(record, member, *permissions);
            if *member == account {
                record.permissions = *permissions;
            }
        }
        Ok(())
    }

    async fn transfer_aim(&self, address: &Address, to: &Address) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.require(address, Permissions::OWNER)?;
        let account = self.account.clone();
        let record = state.aim_mut(address)?;

        let kept = record.permissions - Permissions::OWNER;
        record.permissions = kept;
        set_member(record, &account, kept);

        let existing = record
            .members
            .iter()
            .find(|(m, _)| m == to)
            .map_or(Permissions::empty(), |(_, p)| *p);
        set_member(record, to, existing | Permissions::OWNER);
        Ok(())
    }

    async fn create_flow(&self, flow: NewFlow) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.aim(&flow.from)?;
        state.require(&flow.into, Permissions::NETWORK)?;

        let key = (flow.from.clone(), flow.into.clone());
        if state.flows.contains_key(&key) {
            return Err(LedgerError::Rejected(format!(
                "flow {} -> {} exists",
                flow.from, flow.into
            )));
        }
        state.flows.insert(
            key,
            FlowRecord {
                from: flow.from,
                into: flow.into,
                explanation: flow.explanation,
                weight: flow.weight,
                confirmed: false,
            },
        );
        Ok(())
    }

    async fn update_flow(
        &self,
        from: &Address,
        into: &Address,
        request: UpdateRequest<FlowUpdate>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.require(into, Permissions::NETWORK)?;
        let record = state.flow_mut(from, into)?;
        for update in &request {
            match update {
                FlowUpdate::Explanation(v) => record.explanation.clone_from(v),
                FlowUpdate::Weight(v) => record.weight = *v,
            }
        }
        Ok(())
    }

    async fn set_flow_confirmation(
        &self,
        from: &Address,
        into: &Address,
        confirmed: bool,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.require(into, Permissions::NETWORK)?;
        state.flow_mut(from, into)?.confirmed = confirmed;
        Ok(())
    }
}

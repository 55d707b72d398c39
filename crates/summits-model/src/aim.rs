//! Aims: graph nodes with dirty-tracked data
//!
//! Each independently committed part of an aim (data fields, members, token
//! holdings) keeps its own origins so that committing or resetting one part
//! leaves the others untouched.

use crate::color::Rgb;
use crate::effort::Effort;
use crate::ids::{Address, AimId};
use crate::permissions::{Aspect, Pending, Permissions};
use crate::record::{AimRecord, NewAim, TokenTrade};
use crate::tracked::Tracked;
use crate::update::{AimUpdate, UpdateRequest};
use crate::weight::DEFAULT_LOOP_WEIGHT;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use summits_geometry::{Circle, Vec2};

/// Origin values of staged aim data fields
///
/// A `Some` field differs locally and holds the remote value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AimOrigin {
    /// Remote title
    pub title: Option<String>,
    /// Remote description
    pub description: Option<String>,
    /// Remote status
    pub state: Option<String>,
    /// Remote effort
    pub effort: Option<Effort>,
    /// Remote colour
    pub color: Option<Rgb>,
    /// Remote loop weight
    pub loop_weight: Option<u16>,
}

impl AimOrigin {
    /// No field is staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Graph node
#[derive(Debug, Clone)]
pub struct Aim {
    id: AimId,
    address: Option<Address>,

    title: Tracked<String>,
    description: Tracked<String>,
    state: Tracked<String>,
    effort: Tracked<Effort>,
    color: Tracked<Rgb>,
    loop_weight: Tracked<u16>,
    loop_share: f64,

    /// Token name, fixed at creation
    pub token_name: String,
    /// Token symbol, fixed at creation
    pub token_symbol: String,
    tokens: Tracked<u128>,
    total_supply: u128,
    radius_divisor: f64,
    r: f64,

    /// Permissions of the connected account
    pub permissions: Permissions,
    members: IndexMap<Address, Tracked<Permissions>>,

    /// Map position in logical space
    pub pos: Vec2,
    /// Neighbour loading depth requested for this aim
    pub load_level: u32,

    pub(crate) flows_from: IndexSet<AimId>,
    pub(crate) flows_into: IndexSet<AimId>,

    pending: Pending,
}

impl Aim {
    /// Local, unpublished aim with defaults
    ///
    /// `radius_divisor` is the `k` in `r = sqrt(local_supply) / k`.
    #[must_use]
    pub fn new(id: AimId, radius_divisor: f64) -> Self {
        Self {
            id,
            address: None,
            title: Tracked::default(),
            description: Tracked::default(),
            state: Tracked::default(),
            effort: Tracked::default(),
            color: Tracked::default(),
            loop_weight: Tracked::new(DEFAULT_LOOP_WEIGHT),
            loop_share: 1.0,
            token_name: String::new(),
            token_symbol: String::new(),
            tokens: Tracked::new(0),
            total_supply: 0,
            radius_divisor,
            r: 0.0,
            permissions: Permissions::empty(),
            members: IndexMap::new(),
            pos: Vec2::ZERO,
            load_level: 0,
            flows_from: IndexSet::new(),
            flows_into: IndexSet::new(),
            pending: Pending::default(),
        }
    }

    /// With a different initial loop weight, as remote state
    #[must_use]
    pub fn with_loop_weight(mut self, loop_weight: u16) -> Self {
        self.loop_weight = Tracked::new(loop_weight);
        self
    }

    /// Published aim hydrated from a ledger record
    #[must_use]
    pub fn from_record(id: AimId, record: &AimRecord, radius_divisor: f64) -> Self {
        let mut aim = Self::new(id, radius_divisor);
        aim.hydrate(record);
        aim
    }

    /// Overwrite every field with remote values, dropping local edits
    ///
    /// Adjacency, position and pending flags are kept.
    pub fn hydrate(&mut self, record: &AimRecord) {
        self.address = Some(record.address.clone());
        self.title.hydrate(record.title.clone());
        self.description.hydrate(record.description.clone());
        self.state.hydrate(record.state.clone());
        self.effort.hydrate(record.effort);
        self.color.hydrate(record.color);
        self.loop_weight.hydrate(record.loop_weight);
        self.token_name.clone_from(&record.token_name);
        self.token_symbol.clone_from(&record.token_symbol);
        self.tokens.hydrate(record.tokens);
        self.total_supply = record.total_supply;
        self.permissions = record.permissions;
        self.members = record
            .members
            .iter()
            .map(|(member, perms)| (member.clone(), Tracked::new(*perms)))
            .collect();
        self.update_radius();
    }

    /// Local id
    #[inline]
    #[must_use]
    pub fn id(&self) -> AimId {
        self.id
    }

    /// Ledger address once published
    #[inline]
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Known to the ledger
    #[inline]
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.address.is_some()
    }

    /// Mark published at `address`
    ///
    /// `sent` holds the staged data fields that went out with the creation;
    /// they now match the ledger. Edits made after `sent` was taken stay
    /// staged, as do members and token holdings.
    pub fn mark_published(&mut self, address: Address, sent: &UpdateRequest<AimUpdate>) {
        self.address = Some(address);
        self.settle_data(sent);
    }

    /// Title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.get()
    }

    /// Description
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.get()
    }

    /// Status
    #[inline]
    #[must_use]
    pub fn state(&self) -> &str {
        self.state.get()
    }

    /// Effort estimate
    #[inline]
    #[must_use]
    pub fn effort(&self) -> Effort {
        *self.effort.get()
    }

    /// Display colour
    #[inline]
    #[must_use]
    pub fn color(&self) -> Rgb {
        *self.color.get()
    }

    /// Self-retention weight
    #[inline]
    #[must_use]
    pub fn loop_weight(&self) -> u16 {
        *self.loop_weight.get()
    }

    /// Share retained by the aim, derived from its inflows
    #[inline]
    #[must_use]
    pub fn loop_share(&self) -> f64 {
        self.loop_share
    }

    pub(crate) fn set_loop_share(&mut self, share: f64) {
        self.loop_share = share;
    }

    /// Stage a data field edit; returns `false` if nothing changed
    ///
    /// Aims already in a [`Graph`](crate::Graph) go through
    /// [`Graph::update_aim`](crate::Graph::update_aim) so shares stay current.
    pub fn apply(&mut self, update: AimUpdate) -> bool {
        match update {
            AimUpdate::Title(v) => self.title.set(v),
            AimUpdate::Description(v) => self.description.set(v),
            AimUpdate::State(v) => self.state.set(v),
            AimUpdate::Effort(v) => self.effort.set(v),
            AimUpdate::Color(v) => self.color.set(v),
            AimUpdate::LoopWeight(v) => self.loop_weight.set(v),
        }
    }

    /// Staged data fields with their new values
    #[must_use]
    pub fn data_updates(&self) -> UpdateRequest<AimUpdate> {
        let mut request = UpdateRequest::new();
        if let Some(v) = self.title.staged() {
            request.push(AimUpdate::Title(v.clone()));
        }
        if let Some(v) = self.description.staged() {
            request.push(AimUpdate::Description(v.clone()));
        }
        if let Some(v) = self.state.staged() {
            request.push(AimUpdate::State(v.clone()));
        }
        if let Some(v) = self.effort.staged() {
            request.push(AimUpdate::Effort(*v));
        }
        if let Some(v) = self.color.staged() {
            request.push(AimUpdate::Color(*v));
        }
        if let Some(v) = self.loop_weight.staged() {
            request.push(AimUpdate::LoopWeight(*v));
        }
        request
    }

    /// Origin snapshot of the data fields
    #[must_use]
    pub fn data_origin(&self) -> AimOrigin {
        AimOrigin {
            title: self.title.origin().cloned(),
            description: self.description.origin().cloned(),
            state: self.state.origin().cloned(),
            effort: self.effort.origin().copied(),
            color: self.color.origin().copied(),
            loop_weight: self.loop_weight.origin().copied(),
        }
    }

    /// Any data field staged
    #[must_use]
    pub fn has_data_changes(&self) -> bool {
        self.title.is_dirty()
            || self.description.is_dirty()
            || self.state.is_dirty()
            || self.effort.is_dirty()
            || self.color.is_dirty()
            || self.loop_weight.is_dirty()
    }

    /// Restore every staged data field
    pub(crate) fn reset_data(&mut self) {
        self.title.reset();
        self.description.reset();
        self.state.reset();
        self.effort.reset();
        self.color.reset();
        self.loop_weight.reset();
    }

    /// Record that `request` is now the remote state
    pub fn settle_data(&mut self, request: &UpdateRequest<AimUpdate>) {
        for update in request {
            match update {
                AimUpdate::Title(v) => self.title.settle(v),
                AimUpdate::Description(v) => self.description.settle(v),
                AimUpdate::State(v) => self.state.settle(v),
                AimUpdate::Effort(v) => self.effort.settle(v),
                AimUpdate::Color(v) => self.color.settle(v),
                AimUpdate::LoopWeight(v) => self.loop_weight.settle(v),
            }
        }
    }

    /// Payload to publish this aim
    #[must_use]
    pub fn new_aim(&self) -> NewAim {
        NewAim {
            title: self.title().to_string(),
            description: self.description().to_string(),
            state: self.state().to_string(),
            effort: self.effort(),
            color: self.color(),
            loop_weight: self.loop_weight(),
            token_name: self.token_name.clone(),
            token_symbol: self.token_symbol.clone(),
        }
    }

    /// Tokens held locally, including a staged trade
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> u128 {
        *self.tokens.get()
    }

    /// Tokens held according to the ledger
    #[inline]
    #[must_use]
    pub fn chain_tokens(&self) -> u128 {
        *self.tokens.remote()
    }

    /// Total supply according to the ledger
    #[inline]
    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Supply as if the staged trade were committed
    #[must_use]
    pub fn local_supply(&self) -> u128 {
        self.total_supply
            .saturating_add(self.tokens())
            .saturating_sub(self.chain_tokens())
    }

    /// Radius on the map
    #[inline]
    #[must_use]
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Circle on the map
    #[inline]
    #[must_use]
    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.r)
    }

    fn update_radius(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let supply = self.local_supply() as f64;
        self.r = if self.radius_divisor > 0.0 {
            supply.sqrt() / self.radius_divisor
        } else {
            0.0
        };
    }

    /// Stage a new token holding
    pub fn set_tokens(&mut self, tokens: u128) -> bool {
        let changed = self.tokens.set(tokens);
        self.update_radius();
        changed
    }

    /// Trade that would realize the staged holding
    #[must_use]
    pub fn token_trade(&self) -> Option<TokenTrade> {
        TokenTrade::between(self.chain_tokens(), self.tokens())
    }

    /// Drop the staged holding
    pub fn reset_tokens(&mut self) {
        self.tokens.reset();
        self.update_radius();
    }

    /// Record that `trade` went through
    pub fn settle_trade(&mut self, trade: TokenTrade) {
        let held = self.chain_tokens();
        let now_held = match trade {
            TokenTrade::Buy(n) => {
                self.total_supply = self.total_supply.saturating_add(n);
                held.saturating_add(n)
            }
            TokenTrade::Sell(n) => {
                self.total_supply = self.total_supply.saturating_sub(n);
                held.saturating_sub(n)
            }
        };
        self.tokens.settle(&now_held);
        self.update_radius();
    }

    /// Has a staged token holding
    #[must_use]
    pub fn has_token_changes(&self) -> bool {
        self.tokens.is_dirty()
    }

    /// Permissions of `member`, including staged ones
    #[must_use]
    pub fn member_permissions(&self, member: &Address) -> Option<Permissions> {
        self.members.get(member).map(|t| *t.get())
    }

    /// All members with their live permissions
    pub fn members(&self) -> impl Iterator<Item = (&Address, Permissions)> {
        self.members.iter().map(|(a, t)| (a, *t.get()))
    }

    /// Stage permissions for `member`
    ///
    /// A member unknown to the ledger counts as holding no permissions.
    pub fn set_member_permissions(&mut self, member: Address, permissions: Permissions) -> bool {
        self.members
            .entry(member)
            .or_insert_with(|| Tracked::new(Permissions::empty()))
            .set(permissions)
    }

    /// Staged member permissions
    #[must_use]
    pub fn member_updates(&self) -> Vec<(Address, Permissions)> {
        self.members
            .iter()
            .filter_map(|(a, t)| t.staged().map(|p| (a.clone(), *p)))
            .collect()
    }

    /// Any member permissions staged
    #[must_use]
    pub fn has_member_changes(&self) -> bool {
        self.members.values().any(Tracked::is_dirty)
    }

    /// Restore member permissions, forgetting members that had none
    pub fn reset_members(&mut self) {
        for tracked in self.members.values_mut() {
            tracked.reset();
        }
        self.members.retain(|_, t| !t.get().is_empty());
    }

    /// Record that `updates` are now the remote member permissions
    pub fn settle_members(&mut self, updates: &[(Address, Permissions)]) {
        for (member, permissions) in updates {
            if let Some(tracked) = self.members.get_mut(member) {
                tracked.settle(permissions);
            }
        }
    }

    /// Aims flowing into this one
    pub fn flows_from(&self) -> impl Iterator<Item = AimId> + '_ {
        self.flows_from.iter().copied()
    }

    /// Aims this one flows into
    pub fn flows_into(&self) -> impl Iterator<Item = AimId> + '_ {
        self.flows_into.iter().copied()
    }

    /// Aspects with staged, uncommitted changes
    #[must_use]
    pub fn changed_aspects(&self) -> Vec<Aspect> {
        let mut aspects = Vec::new();
        if self.has_data_changes() {
            aspects.push(Aspect::Data);
        }
        if self.has_member_changes() {
            aspects.push(Aspect::Members);
        }
        if self.has_token_changes() {
            aspects.push(Aspect::Investment);
        }
        aspects
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

    /// Any ledger transaction in flight
    #[inline]
    #[must_use]
    pub fn has_pending_transactions(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effort::EffortUnit;

    fn address(hex: &str) -> Address {
        hex.parse().unwrap()
    }

    fn published() -> Aim {
        let mut record = AimRecord::new(address("0xa1"), "remote title");
        record.tokens = 100;
        record.total_supply = 400;
        Aim::from_record(AimId::next(), &record, 1.0)
    }

    #[test]
    fn hydrated_aim_is_clean() {
        let aim = published();
        assert!(aim.is_published());
        assert!(!aim.has_data_changes());
        assert!(aim.data_origin().is_empty());
        assert_eq!(aim.r(), 20.0);
    }

    #[test]
    fn data_edits_build_one_request() {
        let mut aim = published();
        aim.apply(AimUpdate::Title("new".into()));
        aim.apply(AimUpdate::Effort(Effort::new(EffortUnit::Day, 2.0)));

        let request = aim.data_updates();
        assert_eq!(request.fields(), vec!["title", "effort"]);
        assert_eq!(aim.data_origin().title.as_deref(), Some("remote title"));
    }

    #[test]
    fn reset_restores_data() {
        let mut aim = published();
        aim.apply(AimUpdate::Title("x".into()));
        aim.apply(AimUpdate::Title("y".into()));
        aim.apply(AimUpdate::Color(Rgb::NEUTRAL));
        aim.reset_data();
        assert_eq!(aim.title(), "remote title");
        assert_eq!(aim.color(), Rgb::default());
        assert!(aim.data_origin().is_empty());
    }

    #[test]
    fn radius_follows_staged_tokens() {
        let mut aim = published();
        aim.set_tokens(1000);
        assert_eq!(aim.local_supply(), 1300);
        assert!((aim.r() - 1300f64.sqrt()).abs() < 1e-12);
        assert_eq!(aim.token_trade(), Some(TokenTrade::Buy(900)));

        aim.reset_tokens();
        assert_eq!(aim.r(), 20.0);
        assert_eq!(aim.token_trade(), None);
    }

    #[test]
    fn settled_trade_updates_supply() {
        let mut aim = published();
        aim.set_tokens(40);
        aim.settle_trade(TokenTrade::Sell(60));
        assert_eq!(aim.total_supply(), 340);
        assert_eq!(aim.chain_tokens(), 40);
        assert!(!aim.has_token_changes());
        assert!((aim.r() - 340f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn members_track_independently() {
        let mut aim = published();
        let m = address("0xb2");
        aim.set_member_permissions(m.clone(), Permissions::EDIT);
        assert!(aim.has_member_changes());
        assert!(!aim.has_data_changes());
        assert_eq!(aim.member_updates(), vec![(m.clone(), Permissions::EDIT)]);

        aim.reset_members();
        assert_eq!(aim.member_permissions(&m), None);
    }

    #[test]
    fn publishing_settles_data_only() {
        let mut aim = Aim::new(AimId::next(), 1.0);
        aim.apply(AimUpdate::Title("local".into()));
        aim.set_member_permissions(address("0xc3"), Permissions::FULL);
        assert_eq!(aim.changed_aspects(), vec![Aspect::Data, Aspect::Members]);

        let sent = aim.data_updates();
        aim.mark_published(address("0xd4"), &sent);
        assert_eq!(aim.changed_aspects(), vec![Aspect::Members]);
        assert_eq!(aim.title(), "local");
        assert_eq!(aim.address(), Some(&address("0xd4")));
    }
}

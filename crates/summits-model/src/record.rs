//! Remote state as read from the ledger

use crate::color::Rgb;
use crate::effort::Effort;
use crate::ids::Address;
use crate::permissions::Permissions;
use crate::weight::{DEFAULT_FLOW_WEIGHT, DEFAULT_LOOP_WEIGHT};
use serde::{Deserialize, Serialize};

/// Full field set of a published aim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimRecord {
    /// Ledger address
    pub address: Address,
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Status
    #[serde(default)]
    pub state: String,
    /// Effort estimate
    #[serde(default)]
    pub effort: Effort,
    /// Display colour
    #[serde(default)]
    pub color: Rgb,
    /// Self-retention weight
    #[serde(default = "default_loop_weight")]
    pub loop_weight: u16,
    /// Token name
    #[serde(default)]
    pub token_name: String,
    /// Token symbol
    #[serde(default)]
    pub token_symbol: String,
    /// Tokens held by the connected account
    #[serde(default)]
    pub tokens: u128,
    /// Total token supply
    #[serde(default)]
    pub total_supply: u128,
    /// Permissions of the connected account
    #[serde(default)]
    pub permissions: Permissions,
    /// Members and their permissions
    #[serde(default)]
    pub members: Vec<(Address, Permissions)>,
    /// Aims flowing into this one
    #[serde(default)]
    pub inflows: Vec<Address>,
    /// Aims this one flows into
    #[serde(default)]
    pub outflows: Vec<Address>,
}

impl AimRecord {
    /// Record with defaults for everything but address and title
    #[must_use]
    pub fn new(address: Address, title: impl Into<String>) -> Self {
        Self {
            address,
            title: title.into(),
            description: String::new(),
            state: String::new(),
            effort: Effort::default(),
            color: Rgb::default(),
            loop_weight: DEFAULT_LOOP_WEIGHT,
            token_name: String::new(),
            token_symbol: String::new(),
            tokens: 0,
            total_supply: 0,
            permissions: Permissions::empty(),
            members: Vec::new(),
            inflows: Vec::new(),
            outflows: Vec::new(),
        }
    }

    /// Every neighbour address, inflows first
    pub fn neighbours(&self) -> impl Iterator<Item = &Address> {
        self.inflows.iter().chain(self.outflows.iter())
    }
}

fn default_loop_weight() -> u16 {
    DEFAULT_LOOP_WEIGHT
}

fn default_flow_weight() -> u16 {
    DEFAULT_FLOW_WEIGHT
}

/// Full field set of a published flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Source aim address
    pub from: Address,
    /// Target aim address
    pub into: Address,
    /// Explanation text
    #[serde(default)]
    pub explanation: String,
    /// Weight
    #[serde(default = "default_flow_weight")]
    pub weight: u16,
    /// Confirmed by the target aim
    #[serde(default)]
    pub confirmed: bool,
}

/// Payload for publishing a local aim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAim {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Status
    pub state: String,
    /// Effort estimate
    pub effort: Effort,
    /// Display colour
    pub color: Rgb,
    /// Self-retention weight
    pub loop_weight: u16,
    /// Token name
    pub token_name: String,
    /// Token symbol
    pub token_symbol: String,
}

/// Payload for publishing a local flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFlow {
    /// Source aim address
    pub from: Address,
    /// Target aim address
    pub into: Address,
    /// Explanation text
    pub explanation: String,
    /// Weight
    pub weight: u16,
}

/// Token trade that realizes a staged investment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenTrade {
    /// Acquire tokens
    Buy(u128),
    /// Dispose of tokens
    Sell(u128),
}

impl TokenTrade {
    /// Trade moving holdings from `held` to `wanted`; `None` if equal
    #[must_use]
    pub fn between(held: u128, wanted: u128) -> Option<Self> {
        match wanted.cmp(&held) {
            std::cmp::Ordering::Greater => Some(Self::Buy(wanted - held)),
            std::cmp::Ordering::Less => Some(Self::Sell(held - wanted)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

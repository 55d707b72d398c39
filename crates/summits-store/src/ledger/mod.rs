//! Remote ledger interface
//!
//! The store only ever talks to the ledger through [`Ledger`]. Every call is
//! one round trip; batched updates carry all staged fields of an aspect.

mod memory;

pub use memory::{LedgerSnapshot, MemoryLedger};

use summits_model::{
    Address, AimRecord, AimUpdate, FlowRecord, FlowUpdate, NewAim, NewFlow, Permissions,
    TokenTrade, UpdateRequest,
};

/// Ledger call failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The ledger refused the transaction
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transport or provider failure
    #[error("provider error: {0}")]
    Provider(String),

    /// Nothing at that address
    #[error("not found: {0}")]
    NotFound(String),
}

/// Remote source of truth for aims and flows
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Address of the home aim
    async fn base_aim(&self) -> Result<Address, LedgerError>;

    /// Full record of an aim, with adjacent addresses
    async fn fetch_aim(&self, address: &Address) -> Result<AimRecord, LedgerError>;

    /// Full record of a flow
    async fn fetch_flow(&self, from: &Address, into: &Address) -> Result<FlowRecord, LedgerError>;

    /// Publish a new aim; returns its address
    async fn create_aim(&self, aim: NewAim) -> Result<Address, LedgerError>;

    /// Apply a batch of data field updates
    async fn update_aim(
        &self,
        address: &Address,
        request: UpdateRequest<AimUpdate>,
    ) -> Result<(), LedgerError>;

    /// Buy or sell tokens of an aim
    async fn trade_tokens(&self, address: &Address, trade: TokenTrade) -> Result<(), LedgerError>;

    /// Apply a batch of member permission changes
    async fn update_members(
        &self,
        address: &Address,
        members: Vec<(Address, Permissions)>,
    ) -> Result<(), LedgerError>;

    /// Hand ownership of an aim to `to`
    async fn transfer_aim(&self, address: &Address, to: &Address) -> Result<(), LedgerError>;

    /// Publish a new flow between two published aims
    async fn create_flow(&self, flow: NewFlow) -> Result<(), LedgerError>;

    /// Apply a batch of flow field updates
    async fn update_flow(
        &self,
        from: &Address,
        into: &Address,
        request: UpdateRequest<FlowUpdate>,
    ) -> Result<(), LedgerError>;

    /// Confirm or withdraw confirmation of a flow
    async fn set_flow_confirmation(
        &self,
        from: &Address,
        into: &Address,
        confirmed: bool,
    ) -> Result<(), LedgerError>;
}

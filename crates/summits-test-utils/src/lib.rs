//! Testing utilities for the Summits workspace
//!
//! Shared fixtures and ledger doubles.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use summits_model::{
    Address, AimRecord, AimUpdate, FlowRecord, FlowUpdate, NewAim, NewFlow, Permissions,
    TokenTrade, UpdateRequest,
};
use summits_store::{AimNetwork, Ledger, LedgerError, LedgerSnapshot, MemoryLedger, SummitsConfig};
use tokio::sync::{watch, Semaphore};

/// Connected account used by every fixture
pub fn account() -> Address {
    address(0xacc)
}

/// Deterministic address from a number
pub fn address(n: u64) -> Address {
    format!("0x{n:040x}").parse().unwrap()
}

/// Aim record the fixture account fully controls
pub fn aim_record(n: u64, title: &str) -> AimRecord {
    let mut record = AimRecord::new(address(n), title);
    record.permissions = Permissions::FULL;
    record.members.push((account(), Permissions::FULL));
    record
}

pub fn flow_record(from: u64, into: u64) -> FlowRecord {
    FlowRecord {
        from: address(from),
        into: address(into),
        explanation: format!("{from} feeds {into}"),
        weight: summits_model::DEFAULT_FLOW_WEIGHT,
        confirmed: false,
    }
}

/// Small network, home aim `1`:
///
/// ```text
/// 2 -> 1 -> 3 -> 4
///      ^
///      5
/// ```
pub fn sample_snapshot() -> LedgerSnapshot {
    LedgerSnapshot {
        account: Some(account()),
        base: Some(address(1)),
        aims: vec![
            aim_record(1, "home"),
            aim_record(2, "two"),
            aim_record(3, "three"),
            aim_record(4, "four"),
            aim_record(5, "five"),
        ],
        flows: vec![
            flow_record(2, 1),
            flow_record(1, 3),
            flow_record(3, 4),
            flow_record(5, 1),
        ],
    }
}

pub fn sample_ledger() -> Arc<MemoryLedger> {
    Arc::new(MemoryLedger::from_snapshot(sample_snapshot(), account()))
}

pub fn empty_ledger() -> Arc<MemoryLedger> {
    Arc::new(MemoryLedger::new(account()))
}

pub fn network_over(ledger: Arc<dyn Ledger>) -> AimNetwork {
    AimNetwork::new(ledger, SummitsConfig::default())
}

/// Ledger whose write calls wait until released
///
/// Reads pass straight through. Each write bumps the entry count seen by
/// [`GatedLedger::entered`] and then takes one permit.
#[derive(Debug)]
pub struct GatedLedger {
    inner: Arc<MemoryLedger>,
    permits: Semaphore,
    writes: watch::Sender<usize>,
}

impl GatedLedger {
    pub fn new(inner: Arc<MemoryLedger>) -> Self {
        Self {
            inner,
            permits: Semaphore::new(0),
            writes: watch::Sender::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryLedger {
        &self.inner
    }

    /// Let `n` waiting or future writes through
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Let every write through from now on
    pub fn open(&self) {
        self.permits.add_permits(1 << 20);
    }

    /// Wait until `n` writes in total have reached the ledger
    pub async fn entered(&self, n: usize) {
        let mut writes = self.writes.subscribe();
        // the sender lives in `self`, so this cannot close
        let _ = writes.wait_for(|&count| count >= n).await;
    }

    pub fn writes(&self) -> usize {
        *self.writes.borrow()
    }

    async fn gate(&self) -> Result<(), LedgerError> {
        self.writes.send_modify(|count| *count += 1);
        self.permits
            .acquire()
            .await
            .map(tokio::sync::SemaphorePermit::forget)
            .map_err(|e| LedgerError::Provider(e.to_string()))
    }
}

/// Ledger whose write calls fail with a provider error while armed
#[derive(Debug)]
pub struct FailingLedger {
    inner: Arc<MemoryLedger>,
    failing: AtomicBool,
}

impl FailingLedger {
    /// Armed from the start
    pub fn new(inner: Arc<MemoryLedger>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(true),
        }
    }

    pub fn inner(&self) -> &MemoryLedger {
        &self.inner
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn gate(&self) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(LedgerError::Provider("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Implements [`Ledger`] by delegating to `inner` after `gate`
macro_rules! delegate_ledger {
    ($ty:ty, $($gate:tt)+) => {
        #[async_trait::async_trait]
        impl Ledger for $ty {
            async fn base_aim(&self) -> Result<Address, LedgerError> {
                self.inner.base_aim().await
            }

            async fn fetch_aim(&self, address: &Address) -> Result<AimRecord, LedgerError> {
                self.inner.fetch_aim(address).await
            }

            async fn fetch_flow(
                &self,
                from: &Address,
                into: &Address,
            ) -> Result<FlowRecord, LedgerError> {
                self.inner.fetch_flow(from, into).await
            }

            async fn create_aim(&self, aim: NewAim) -> Result<Address, LedgerError> {
                self.$($gate)+?;
                self.inner.create_aim(aim).await
            }

            async fn update_aim(
                &self,
                address: &Address,
                request: UpdateRequest<AimUpdate>,
            ) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.update_aim(address, request).await
            }

            async fn trade_tokens(
                &self,
                address: &Address,
                trade: TokenTrade,
            ) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.trade_tokens(address, trade).await
            }

            async fn update_members(
                &self,
                address: &Address,
                members: Vec<(Address, Permissions)>,
            ) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.update_members(address, members).await
            }

            async fn transfer_aim(&self, address: &Address, to: &Address) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.transfer_aim(address, to).await
            }

            async fn create_flow(&self, flow: NewFlow) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.create_flow(flow).await
            }

            async fn update_flow(
                &self,
                from: &Address,
                into: &Address,
                request: UpdateRequest<FlowUpdate>,
            ) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.update_flow(from, into, request).await
            }

            async fn set_flow_confirmation(
                &self,
                from: &Address,
                into: &Address,
                confirmed: bool,
            ) -> Result<(), LedgerError> {
                self.$($gate)+?;
                self.inner.set_flow_confirmation(from, into, confirmed).await
            }
        }
    };
}

delegate_ledger!(GatedLedger, gate().await);
delegate_ledger!(FailingLedger, gate());

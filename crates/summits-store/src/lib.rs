//! Summits Store
//!
//! Keeps a local aim graph in sync with a remote ledger. Edits are staged
//! optimistically and committed per aspect; a failed commit leaves the staged
//! values in place so the user can retry or discard.
//!
//! # Core Concepts
//!
//! - [`Ledger`]: async remote with one call per aspect; [`MemoryLedger`] for tests
//! - [`AimNetwork`]: the store, loading, editing and committing aims and flows
//! - [`ActivityLog`]: user-visible outcomes of ledger transactions
//! - [`Pins`]: pinned aims per network and account over a [`KeyValueStore`]
//! - [`UiState`]: screen, side menu, pointer interaction and view transform
//! - [`SummitsConfig`]: network table and map constants, loadable from TOML
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use summits_model::AimUpdate;
//! use summits_store::{AimNetwork, MemoryLedger, SummitsConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = Arc::new(MemoryLedger::new("0xacc".parse()?));
//! let network = AimNetwork::new(ledger, SummitsConfig::default());
//!
//! let id = network.create_and_select_aim(|_| {});
//! network.update_aim(id, AimUpdate::Title("Climb".into()))?;
//! network.publish_aim(id).await?;
//!
//! assert!(network.changes().is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod activity;
mod config;
mod error;
mod ledger;
mod network;
mod persist;
mod render;
mod ui;

// Re-exports
pub use activity::{Activity, ActivityLog, Severity};
pub use config::{ConfigError, NativeCurrency, NetworkInfo, SummitsConfig};
pub use error::{Result, StoreError};
pub use ledger::{Ledger, LedgerError, LedgerSnapshot, MemoryLedger};
pub use network::{AimNetwork, Selection};
pub use persist::{pins_key, JsonFileStore, KeyValueStore, MemoryStore, PersistError, Pins};
pub use render::{render_svg, RenderOptions};
pub use ui::{Interaction, PointerEffect, UiState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

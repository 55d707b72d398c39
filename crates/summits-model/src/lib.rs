//! Summits Model
//!
//! Aim/flow graph entities with per-field dirty tracking, so a client can
//! edit optimistically and commit or discard against a remote ledger.
//!
//! # Core Concepts
//!
//! - [`Tracked<T>`]: live value plus the remote value it differs from
//! - [`Aim`]: graph node; data, members and tokens tracked independently
//! - [`Flow`]: weighted edge; share derived from its target's inflows
//! - [`Graph`]: owns aims and flows, recomputes shares eagerly
//! - [`UpdateRequest`]: batched field updates for a single ledger call
//! - [`Graph::changes`]: everything not yet committed
//!
//! # Example
//!
//! ```rust
//! use summits_model::{Aim, AimId, AimUpdate, Graph};
//!
//! let mut graph = Graph::new();
//! let id = graph.insert_aim(Aim::new(AimId::next(), 1e7));
//! graph.update_aim(id, AimUpdate::Title("Climb".into())).unwrap();
//!
//! let aim = graph.aim(id).unwrap();
//! assert_eq!(aim.data_updates().fields(), vec!["title"]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aim;
mod amount;
mod changes;
mod color;
mod effort;
mod error;
mod flow;
mod graph;
mod ids;
mod permissions;
mod record;
mod tracked;
mod update;
mod weight;

// Re-exports
pub use aim::{Aim, AimOrigin};
pub use amount::{humanize_amount, DECIMALS};
pub use changes::{AimChanges, FlowChange};
pub use color::Rgb;
pub use effort::{Effort, EffortUnit};
pub use error::ModelError;
pub use flow::Flow;
pub use graph::Graph;
pub use ids::{Address, AimId, FlowKey};
pub use permissions::{Aspect, Pending, Permissions};
pub use record::{AimRecord, FlowRecord, NewAim, NewFlow, TokenTrade};
pub use tracked::Tracked;
pub use update::{AimUpdate, FieldUpdate, FlowUpdate, UpdateRequest};
pub use weight::{
    clamp_weight, clamp_weight_f64, distribute, ShareSplit, DEFAULT_FLOW_WEIGHT,
    DEFAULT_LOOP_WEIGHT, MAX_WEIGHT,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

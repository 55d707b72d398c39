//! Summits Geometry
//!
//! Everything the map needs to place and draw the graph.
//!
//! # Core Concepts
//!
//! - [`Vec2`]: `f64` 2D vector with operator overloads
//! - [`Circle`]: node footprint (center + radius)
//! - [`Path`]: SVG-style outline built from [`PathCommand`]s
//! - [`circular_arrow`]: curved flow arrow between two circles
//! - [`Viewport`]: screen ↔ logical transform with anchor-preserving zoom
//! - [`CenterAnimation`]: eased centering driven by external ticks
//!
//! # Example
//!
//! ```rust
//! use summits_geometry::{circular_arrow, Circle, Vec2};
//!
//! let from = Circle::new(Vec2::new(0.0, 0.0), 10.0);
//! let into = Circle::new(Vec2::new(100.0, 0.0), 10.0);
//! let path = circular_arrow(from, into, 0.5);
//!
//! assert!(path.is_closed());
//! assert!(path.to_svg().starts_with("M "));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod arrow;
mod path;
mod vec2;
mod viewport;

// Re-exports
pub use arrow::{arrow_geometry, circular_arrow, ArrowGeometry};
pub use path::{Path, PathCommand};
pub use vec2::{Circle, Vec2};
pub use viewport::{ease_in_out, CenterAnimation, GeometryError, Viewport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Waypoint Core
//!
//! Core traits, types, and errors shared by the Waypoint routing stack.
//!
//! This crate holds the pieces the routing layer consumes but does not own:
//! how stops are identified, where they are, how far apart they are, and
//! which of them are adjacent.
//!
//! ## Key Traits
//!
//! - [`DistanceMetric`]: Cost function between two stop positions
//! - [`StopGraph`]: Abstraction over the stop graph (adjacency + distance)
//!
//! ## Key Types
//!
//! - [`StopId`]: Stable, ordered identifier for a stop (backed by its name)
//! - [`Position`]: Integer grid coordinates of a stop
//! - [`Manhattan`], [`Euclidean`], [`Chebyshev`]: Stock distance metrics

pub mod error;
pub mod identity;
pub mod metric;
pub mod traits;

// Re-export main types
pub use error::*;
pub use identity::*;
pub use metric::*;
pub use traits::*;

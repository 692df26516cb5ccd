//! # Waypoint Routing
//!
//! Distance-vector routing between stops.
//!
//! Every stop owns a [`RoutingTable`] mapping each destination it knows
//! about to a cost and the next hop to forward towards. No stop sees the
//! whole graph; tables converge to shortest paths purely by pushing their
//! entries to adjacent stops, the way RIP routers exchange vectors.
//!
//! ## Core Components
//!
//! - [`RoutingTable`]: Per-stop destination table with a strict-improvement upsert
//! - [`sync`]: Pairwise transfer, reachability traversal and the fixed-point loop
//! - [`Network`]: Arena of stops implementing [`TableGraph`]
//! - [`SharedNetwork`]: Lock-guarded handle that serialises convergence across threads
//!
//! ## Convergence
//!
//! Adding an edge inserts (or improves) the neighbour's entry and then
//! synchronises: full passes over every reachable stop push each table into
//! every adjacent table, until one pass changes nothing. Costs only ever
//! decrease and are bounded below by zero, so the loop always terminates.
//!
//! ## Example
//!
//! ```rust
//! use waypoint_routing::Network;
//!
//! let mut network = Network::new();
//! let a = network.add_stop("A", (0, 0))?;
//! let b = network.add_stop("B", (3, 4))?;
//! let c = network.add_stop("C", (3, 0))?;
//!
//! network.add_neighbour(&a, &b)?;
//! network.add_neighbour(&b, &c)?;
//!
//! assert_eq!(network.cost_to(&a, &c), 11);
//! assert_eq!(network.next_stop(&a, Some(&c)), Some(&b));
//! # Ok::<(), waypoint_routing::RoutingError>(())
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod shared;
pub mod sync;
pub mod table;

// Re-export main types
pub use config::RoutingConfig;
pub use error::{RoutingError, RoutingResult};
pub use network::{Network, Stop};
pub use shared::SharedNetwork;
pub use sync::{SyncReport, TableGraph};
pub use table::{INFINITE_COST, RoutingEntry, RoutingTable};

// Re-export core types for convenience
pub use waypoint_core::{
    Chebyshev, DistanceMetric, Euclidean, Manhattan, NetworkError, Position, StopError, StopGraph,
    StopId,
};

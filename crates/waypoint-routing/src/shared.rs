//! Thread-safe network handle
//!
//! A synchronisation pass touches every table in the reachable subgraph,
//! so two passes must never interleave. [`SharedNetwork`] puts the whole
//! arena behind one lock: mutations hold the write lock until the network
//! has converged again, queries share the read lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use waypoint_core::{DistanceMetric, Manhattan, Position, StopId};

use crate::error::RoutingResult;
use crate::network::Network;
use crate::sync::SyncReport;

/// Cloneable handle to a network shared between threads
pub struct SharedNetwork<M: DistanceMetric = Manhattan> {
    inner: Arc<RwLock<Network<M>>>,
}

impl<M: DistanceMetric> Clone for SharedNetwork<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SharedNetwork<Manhattan> {
    fn default() -> Self {
        Self::new(Network::new())
    }
}

impl<M: DistanceMetric> SharedNetwork<M> {
    /// Wrap an existing network
    pub fn new(network: Network<M>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(network)),
        }
    }

    /// Create a stop and add it to the network
    pub fn add_stop(
        &self,
        name: impl Into<String>,
        position: impl Into<Position>,
    ) -> RoutingResult<StopId> {
        self.inner.write().add_stop(name, position)
    }

    /// Connect two stops; returns once the network has converged
    pub fn add_neighbour(&self, stop: &StopId, neighbour: &StopId) -> RoutingResult<SyncReport> {
        self.inner.write().add_neighbour(stop, neighbour)
    }

    /// Re-converge every table reachable from `start`
    pub fn synchronise(&self, start: &StopId) -> RoutingResult<SyncReport> {
        self.inner.write().synchronise(start)
    }

    /// Cost from `from` to `to`, or `INFINITE_COST` if unknown
    pub fn cost_to(&self, from: &StopId, to: &StopId) -> u32 {
        self.inner.read().cost_to(from, to)
    }

    /// Every destination `from` knows about, with its cost
    pub fn costs(&self, from: &StopId) -> Option<BTreeMap<StopId, u32>> {
        self.inner.read().costs(from)
    }

    /// Next hop from `from` towards `to`, cloned out of the lock
    pub fn next_stop(&self, from: &StopId, to: Option<&StopId>) -> Option<StopId> {
        self.inner.read().next_stop(from, to).cloned()
    }

    /// Full route from `from` to `to`, both ends included
    pub fn path(&self, from: &StopId, to: &StopId) -> Option<Vec<StopId>> {
        self.inner.read().path(from, to)
    }

    /// Run a read-only closure against a consistent view of the network
    pub fn with_network<R>(&self, f: impl FnOnce(&Network<M>) -> R) -> R {
        f(&*self.inner.read())
    }
}

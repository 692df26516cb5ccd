//! Per-stop distance-vector routing table
//!
//! A [`RoutingTable`] maps every destination its stop knows about to the
//! cheapest known cost and the next hop to forward towards. Tables only
//! ever learn better routes: an entry is replaced when a strictly cheaper
//! offer arrives and is never removed.
//!
//! The operations here are purely local. Exchanging entries between
//! adjacent tables lives in [`crate::sync`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;
use waypoint_core::StopId;

/// Cost reported for destinations that are not in a table
///
/// This is a return-value convention only; it is never stored in an entry.
pub const INFINITE_COST: u32 = u32::MAX;

/// Next hop and cost for one destination
///
/// Entries are immutable. Improving a route replaces the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoutingEntry {
    next_hop: StopId,
    cost: u32,
}

impl RoutingEntry {
    /// Create a new routing entry
    pub fn new(next_hop: StopId, cost: u32) -> Self {
        Self { next_hop, cost }
    }

    /// The neighbour to forward towards
    pub fn next_hop(&self) -> &StopId {
        &self.next_hop
    }

    /// Total cost to the destination via [`Self::next_hop`]
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

/// Routing table owned by a single stop
///
/// Always holds `owner -> (owner, 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingTable {
    /// The stop this table routes for
    owner: StopId,
    /// Entries indexed by destination
    entries: BTreeMap<StopId, RoutingEntry>,
}

impl RoutingTable {
    /// Create a table for `owner` holding only its self-entry
    pub fn new(owner: StopId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(owner.clone(), RoutingEntry::new(owner.clone(), 0));
        Self { owner, entries }
    }

    /// The stop this table routes for
    pub fn owner(&self) -> &StopId {
        &self.owner
    }

    /// Add a route, or replace the current one if `new_cost` is strictly lower
    ///
    /// Returns `true` if the table changed. Equal-cost offers are ignored,
    /// which is what stops synchronisation oscillating between tied paths.
    /// An offer of [`INFINITE_COST`] is never stored.
    pub fn add_or_update_entry(
        &mut self,
        destination: StopId,
        new_cost: u32,
        intermediate: StopId,
    ) -> bool {
        if new_cost == INFINITE_COST {
            return false;
        }

        let improves = self
            .entries
            .get(&destination)
            .is_none_or(|current| new_cost < current.cost);

        if improves {
            trace!(
                table = %self.owner,
                destination = %destination,
                via = %intermediate,
                cost = new_cost,
                "Route accepted"
            );
            self.entries.insert(destination, RoutingEntry::new(intermediate, new_cost));
        }

        improves
    }

    /// Cost to reach `destination`, or [`INFINITE_COST`] if unknown
    pub fn cost_to(&self, destination: &StopId) -> u32 {
        self.entries
            .get(destination)
            .map(RoutingEntry::cost)
            .unwrap_or(INFINITE_COST)
    }

    /// Snapshot of every known destination and its cost
    pub fn costs(&self) -> BTreeMap<StopId, u32> {
        self.entries
            .iter()
            .map(|(dest, entry)| (dest.clone(), entry.cost))
            .collect()
    }

    /// Next hop towards `destination`
    ///
    /// Returns `None` when no destination is given or it is not in the table.
    pub fn next_stop(&self, destination: Option<&StopId>) -> Option<&StopId> {
        destination
            .and_then(|dest| self.entries.get(dest))
            .map(RoutingEntry::next_hop)
    }

    /// Get the entry for a destination
    pub fn entry(&self, destination: &StopId) -> Option<&RoutingEntry> {
        self.entries.get(destination)
    }

    /// Iterate over all entries in destination order
    pub fn entries(&self) -> impl Iterator<Item = (&StopId, &RoutingEntry)> {
        self.entries.iter()
    }

    /// Check whether a destination is known
    pub fn contains(&self, destination: &StopId) -> bool {
        self.entries.contains_key(destination)
    }

    /// Number of known destinations (including the owner)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a table holds at least its self-entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Stop arena
//!
//! [`Network`] owns every [`Stop`] and, through each stop, its routing
//! table. Stops refer to each other only by [`StopId`], so the cyclic
//! adjacency graph never turns into an ownership cycle.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use waypoint_core::{DistanceMetric, Manhattan, NetworkError, Position, StopGraph, StopId};

use crate::config::RoutingConfig;
use crate::error::RoutingResult;
use crate::sync::{self, SyncReport, TableGraph};
use crate::table::{INFINITE_COST, RoutingTable};

/// A named location in the network
#[derive(Debug, Clone)]
pub struct Stop {
    id: StopId,
    position: Position,
    /// Adjacent stops; a set, so re-adding an edge is idempotent
    neighbours: BTreeSet<StopId>,
    table: RoutingTable,
}

impl Stop {
    /// Create a stop with no neighbours and a fresh routing table
    pub fn new(name: impl Into<String>, position: impl Into<Position>) -> RoutingResult<Self> {
        let id = StopId::new(name)?;
        Ok(Self {
            table: RoutingTable::new(id.clone()),
            id,
            position: position.into(),
            neighbours: BTreeSet::new(),
        })
    }

    /// The stop's id, backed by its name
    pub fn id(&self) -> &StopId {
        &self.id
    }

    /// Where the stop sits on the grid
    pub fn position(&self) -> Position {
        self.position
    }

    /// Adjacent stops in ascending order
    pub fn neighbours(&self) -> impl Iterator<Item = &StopId> {
        self.neighbours.iter()
    }

    /// This stop's view of the network
    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }
}

/// Container of all stops, with distance-vector routing between them
#[derive(Debug, Clone)]
pub struct Network<M: DistanceMetric = Manhattan> {
    /// All stops indexed by id
    stops: BTreeMap<StopId, Stop>,
    /// Cost function between stop positions
    metric: M,
    /// Synchronisation settings
    config: RoutingConfig,
}

impl Network<Manhattan> {
    /// Create an empty network using Manhattan distance
    pub fn new() -> Self {
        Self::with_metric(Manhattan)
    }
}

impl Default for Network<Manhattan> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: DistanceMetric> Network<M> {
    /// Create an empty network with a custom distance metric
    pub fn with_metric(metric: M) -> Self {
        Self {
            stops: BTreeMap::new(),
            metric,
            config: RoutingConfig::default(),
        }
    }

    /// Use the given synchronisation settings
    pub fn with_config(mut self, config: RoutingConfig) -> Self {
        self.config = config;
        self
    }

    /// Synchronisation settings used by [`Self::add_neighbour`] and [`Self::synchronise`]
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Cost function between stop positions
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Create a stop and add it to the network
    pub fn add_stop(
        &mut self,
        name: impl Into<String>,
        position: impl Into<Position>,
    ) -> RoutingResult<StopId> {
        let stop = Stop::new(name, position)?;
        let id = stop.id.clone();
        self.insert(stop)?;
        Ok(id)
    }

    /// Add an existing stop
    ///
    /// Only the stop's id and position are kept: it joins with no
    /// neighbours and a table holding just its self-entry, so links and
    /// routes learned in another network never leak into this one.
    /// Fails if a stop with the same id is already present.
    pub fn insert(&mut self, stop: Stop) -> Result<(), NetworkError> {
        let Stop { id, position, .. } = stop;
        match self.stops.entry(id) {
            Entry::Occupied(e) => Err(NetworkError::DuplicateStop(e.key().clone())),
            Entry::Vacant(e) => {
                let id = e.key().clone();
                debug!(stop = %id, position = %position, "Stop added");
                e.insert(Stop {
                    table: RoutingTable::new(id.clone()),
                    id,
                    position,
                    neighbours: BTreeSet::new(),
                });
                Ok(())
            }
        }
    }

    /// Look up a stop by id
    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Iterate over all stops in id order
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// Ids of all stops, ascending
    pub fn stop_ids(&self) -> Vec<StopId> {
        self.stops.keys().cloned().collect()
    }

    /// Number of stops
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Check whether the network has no stops
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Connect two stops and re-converge every table reachable from `stop`
    pub fn add_neighbour(
        &mut self,
        stop: &StopId,
        neighbour: &StopId,
    ) -> RoutingResult<SyncReport> {
        let config = self.config.clone();
        sync::add_neighbour(self, stop, neighbour, &config)
    }

    /// Re-converge every table reachable from `start`
    pub fn synchronise(&mut self, start: &StopId) -> RoutingResult<SyncReport> {
        let config = self.config.clone();
        sync::synchronise(self, start, &config)
    }

    /// Push `from`'s entries into the table of adjacent stop `to`
    pub fn transfer_entries(&mut self, from: &StopId, to: &StopId) -> RoutingResult<bool> {
        sync::transfer_entries(self, from, to)
    }

    /// All stops reachable from `start`, `start` first
    pub fn traverse_network(&self, start: &StopId) -> RoutingResult<Vec<StopId>> {
        sync::traverse_network(self, start)
    }

    /// Routing table of `stop`, if it is in the network
    pub fn routing_table(&self, stop: &StopId) -> Option<&RoutingTable> {
        self.stops.get(stop).map(|s| &s.table)
    }

    /// Cost from `from` to `to`, or [`INFINITE_COST`] if either is unknown
    pub fn cost_to(&self, from: &StopId, to: &StopId) -> u32 {
        self.routing_table(from)
            .map(|table| table.cost_to(to))
            .unwrap_or(INFINITE_COST)
    }

    /// Every destination `from` knows about, with its cost
    pub fn costs(&self, from: &StopId) -> Option<BTreeMap<StopId, u32>> {
        self.routing_table(from).map(RoutingTable::costs)
    }

    /// Next hop from `from` towards `to`
    pub fn next_stop(&self, from: &StopId, to: Option<&StopId>) -> Option<&StopId> {
        self.routing_table(from).and_then(|table| table.next_stop(to))
    }

    /// Full route from `from` to `to`, both ends included
    ///
    /// Follows next hops table by table. Returns `None` if `to` is not
    /// reachable or the hops do not lead there within one step per stop.
    pub fn path(&self, from: &StopId, to: &StopId) -> Option<Vec<StopId>> {
        let mut current = self.stops.get(from)?.id.clone();
        let mut path = vec![current.clone()];

        while &current != to {
            if path.len() > self.stops.len() {
                return None;
            }
            let next = self.next_stop(&current, Some(to))?.clone();
            path.push(next.clone());
            current = next;
        }

        Some(path)
    }
}

impl<M: DistanceMetric> StopGraph for Network<M> {
    fn contains(&self, stop: &StopId) -> bool {
        self.stops.contains_key(stop)
    }

    fn distance(&self, a: &StopId, b: &StopId) -> Option<u32> {
        let a = self.stops.get(a)?;
        let b = self.stops.get(b)?;
        Some(self.metric.distance(&a.position, &b.position))
    }

    fn add_adjacency(&mut self, a: &StopId, b: &StopId) -> bool {
        if !self.stops.contains_key(a) || !self.stops.contains_key(b) {
            return false;
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(stop) = self.stops.get_mut(from) {
                stop.neighbours.insert(to.clone());
            }
        }
        true
    }

    fn adjacencies(&self, stop: &StopId) -> Vec<StopId> {
        self.stops
            .get(stop)
            .map(|s| s.neighbours.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn are_adjacent(&self, a: &StopId, b: &StopId) -> bool {
        self.stops.get(a).is_some_and(|s| s.neighbours.contains(b))
    }
}

impl<M: DistanceMetric> TableGraph for Network<M> {
    fn routing_table(&self, stop: &StopId) -> Option<&RoutingTable> {
        self.stops.get(stop).map(|s| &s.table)
    }

    fn routing_table_mut(&mut self, stop: &StopId) -> Option<&mut RoutingTable> {
        self.stops.get_mut(stop).map(|s| &mut s.table)
    }
}

//! Distance-vector convergence
//!
//! Tables converge by repeatedly pushing each stop's entries to every
//! adjacent stop until a full pass over the reachable subgraph changes
//! nothing (distributed Bellman-Ford).
//!
//! ## Termination
//!
//! Every accepted upsert strictly lowers a non-negative cost, and the set
//! of `(stop, destination)` pairs in a finite graph is finite. Only finitely
//! many decreases are possible, so some pass eventually makes none and the
//! outer loop exits.
//!
//! These functions are generic over [`TableGraph`], so they work against
//! any container that can hand out routing tables by [`StopId`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};
use waypoint_core::{StopGraph, StopId};

use crate::config::RoutingConfig;
use crate::error::{RoutingError, RoutingResult};
use crate::table::{INFINITE_COST, RoutingTable};

/// A stop graph whose stops each own a [`RoutingTable`]
pub trait TableGraph: StopGraph {
    /// Get the routing table of a stop
    fn routing_table(&self, stop: &StopId) -> Option<&RoutingTable>;

    /// Get the routing table of a stop, mutably
    fn routing_table_mut(&mut self, stop: &StopId) -> Option<&mut RoutingTable>;
}

/// What a synchronisation run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Full passes over the reachable subgraph, including the final quiet one
    pub passes: u32,
    /// Calls to [`transfer_entries`] across all passes
    pub transfers: usize,
    /// Routes accepted across all passes
    pub updates: usize,
}

impl SyncReport {
    /// `true` if the run found the network already at its fixed point
    pub fn is_quiescent(&self) -> bool {
        self.updates == 0
    }
}

fn ensure_known<G: TableGraph + ?Sized>(graph: &G, stop: &StopId) -> RoutingResult<()> {
    if graph.contains(stop) {
        Ok(())
    } else {
        Err(RoutingError::unknown(stop))
    }
}

/// Make `neighbour` adjacent to `owner` and re-converge the network
///
/// The neighbour's entry in the owner's table is inserted or improved with
/// the metric distance between the two stops. The adjacency is recorded
/// whether or not the entry changed.
///
/// The entry and the adjacency stay in place if synchronisation then fails
/// with [`RoutingError::ConvergenceLimit`]. Tables are left short of the
/// fixed point until [`synchronise`] runs again with a larger (or no) pass
/// limit.
#[instrument(skip_all, fields(owner = %owner, neighbour = %neighbour))]
pub fn add_neighbour<G: TableGraph + ?Sized>(
    graph: &mut G,
    owner: &StopId,
    neighbour: &StopId,
    config: &RoutingConfig,
) -> RoutingResult<SyncReport> {
    if owner == neighbour {
        return Err(RoutingError::SelfLoop(owner.clone()));
    }
    ensure_known(&*graph, owner)?;
    ensure_known(&*graph, neighbour)?;

    let distance = graph
        .distance(owner, neighbour)
        .ok_or_else(|| RoutingError::unknown(neighbour))?;
    let changed = graph
        .routing_table_mut(owner)
        .ok_or_else(|| RoutingError::unknown(owner))?
        .add_or_update_entry(neighbour.clone(), distance, neighbour.clone());
    graph.add_adjacency(owner, neighbour);

    debug!(distance, changed, "Neighbour registered");

    synchronise(graph, owner, config)
}

/// Push `from`'s entries into the table of its neighbour `to`
///
/// Each destination is offered at `from`'s cost plus the distance between
/// the two stops, with `from` as the next hop. Returns `true` if any offer
/// was accepted.
pub fn transfer_entries<G: TableGraph + ?Sized>(
    graph: &mut G,
    from: &StopId,
    to: &StopId,
) -> RoutingResult<bool> {
    Ok(transfer(graph, from, to)? > 0)
}

/// Same as [`transfer_entries`] but reports how many offers were accepted
fn transfer<G: TableGraph + ?Sized>(
    graph: &mut G,
    from: &StopId,
    to: &StopId,
) -> RoutingResult<usize> {
    ensure_known(&*graph, from)?;
    ensure_known(&*graph, to)?;
    if !graph.are_adjacent(from, to) {
        warn!(from = %from, to = %to, "Refusing transfer to non-adjacent stop");
        return Err(RoutingError::InvariantViolation {
            from: from.clone(),
            to: to.clone(),
        });
    }

    let distance = graph
        .distance(from, to)
        .ok_or_else(|| RoutingError::unknown(to))?;

    // Snapshot first; the sender and receiver tables live in the same graph
    let offers: Vec<(StopId, u32)> = graph
        .routing_table(from)
        .ok_or_else(|| RoutingError::unknown(from))?
        .entries()
        .filter_map(|(dest, entry)| {
            entry
                .cost()
                .checked_add(distance)
                .filter(|cost| *cost < INFINITE_COST)
                .map(|cost| (dest.clone(), cost))
        })
        .collect();

    let target = graph
        .routing_table_mut(to)
        .ok_or_else(|| RoutingError::unknown(to))?;

    let mut accepted = 0;
    for (destination, cost) in offers {
        if target.add_or_update_entry(destination, cost, from.clone()) {
            accepted += 1;
        }
    }

    if accepted > 0 {
        trace!(from = %from, to = %to, accepted, "Entries transferred");
    }

    Ok(accepted)
}

/// Every stop reachable from `start`, each exactly once
///
/// Depth-first over adjacencies, visiting neighbours in ascending
/// [`StopId`] order. `start` is always first.
pub fn traverse_network<G: StopGraph + ?Sized>(
    graph: &G,
    start: &StopId,
) -> RoutingResult<Vec<StopId>> {
    if !graph.contains(start) {
        return Err(RoutingError::unknown(start));
    }

    let mut visited: BTreeSet<StopId> = BTreeSet::new();
    let mut reachable = Vec::new();
    let mut stack = vec![start.clone()];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }

        // Reverse so the smallest neighbour is popped first
        for neighbour in graph.adjacencies(&current).into_iter().rev() {
            if !visited.contains(&neighbour) {
                stack.push(neighbour);
            }
        }

        reachable.push(current);
    }

    Ok(reachable)
}

/// Run full transfer passes over everything reachable from `start` until
/// a pass changes no table
#[instrument(skip_all, fields(start = %start))]
pub fn synchronise<G: TableGraph + ?Sized>(
    graph: &mut G,
    start: &StopId,
    config: &RoutingConfig,
) -> RoutingResult<SyncReport> {
    let mut report = SyncReport::default();

    loop {
        if let Some(max_passes) = config.max_passes {
            if report.passes >= max_passes {
                warn!(passes = report.passes, "Synchronisation pass limit reached");
                return Err(RoutingError::ConvergenceLimit {
                    passes: report.passes,
                });
            }
        }

        report.passes += 1;
        let mut changed = false;
        let reachable = traverse_network(&*graph, start)?;

        for stop in &reachable {
            for adjacent in graph.adjacencies(stop) {
                let accepted = transfer(graph, stop, &adjacent)?;
                report.transfers += 1;
                if accepted > 0 {
                    changed = true;
                    report.updates += accepted;
                }
            }
        }

        debug!(
            pass = report.passes,
            stops = reachable.len(),
            changed,
            "Synchronisation pass complete"
        );

        if config.log_tables {
            for stop in &reachable {
                if let Some(table) = graph.routing_table(stop) {
                    trace!(stop = %stop, costs = ?table.costs(), "Table after pass");
                }
            }
        }

        if !changed {
            break;
        }
    }

    info!(
        passes = report.passes,
        transfers = report.transfers,
        updates = report.updates,
        "Network converged"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Minimal graph for unit tests: unit distance on every edge
    struct TestGraph {
        tables: BTreeMap<StopId, RoutingTable>,
        edges: BTreeMap<StopId, BTreeSet<StopId>>,
        weights: BTreeMap<(StopId, StopId), u32>,
    }

    impl TestGraph {
        fn new(names: &[&str]) -> Self {
            let mut tables = BTreeMap::new();
            let mut edges = BTreeMap::new();
            for name in names {
                let id = make_id(name);
                tables.insert(id.clone(), RoutingTable::new(id.clone()));
                edges.insert(id, BTreeSet::new());
            }
            Self {
                tables,
                edges,
                weights: BTreeMap::new(),
            }
        }

        fn set_weight(&mut self, a: &str, b: &str, weight: u32) {
            let (a, b) = (make_id(a), make_id(b));
            self.weights.insert((a.clone(), b.clone()), weight);
            self.weights.insert((b, a), weight);
        }
    }

    impl StopGraph for TestGraph {
        fn contains(&self, stop: &StopId) -> bool {
            self.tables.contains_key(stop)
        }

        fn distance(&self, a: &StopId, b: &StopId) -> Option<u32> {
            if !self.contains(a) || !self.contains(b) {
                return None;
            }
            Some(
                self.weights
                    .get(&(a.clone(), b.clone()))
                    .copied()
                    .unwrap_or(1),
            )
        }

        fn add_adjacency(&mut self, a: &StopId, b: &StopId) -> bool {
            if !self.contains(a) || !self.contains(b) {
                return false;
            }
            self.edges.entry(a.clone()).or_default().insert(b.clone());
            self.edges.entry(b.clone()).or_default().insert(a.clone());
            true
        }

        fn adjacencies(&self, stop: &StopId) -> Vec<StopId> {
            self.edges
                .get(stop)
                .map(|n| n.iter().cloned().collect())
                .unwrap_or_default()
        }
    }

    impl TableGraph for TestGraph {
        fn routing_table(&self, stop: &StopId) -> Option<&RoutingTable> {
            self.tables.get(stop)
        }

        fn routing_table_mut(&mut self, stop: &StopId) -> Option<&mut RoutingTable> {
            self.tables.get_mut(stop)
        }
    }

    fn make_id(name: &str) -> StopId {
        StopId::new(name).unwrap()
    }

    fn cost(graph: &TestGraph, from: &str, to: &str) -> u32 {
        graph.tables[&make_id(from)].cost_to(&make_id(to))
    }

    #[test]
    fn test_add_neighbour_links_both_ways() {
        let mut graph = TestGraph::new(&["A", "B"]);
        let config = RoutingConfig::default();
        let (a, b) = (make_id("A"), make_id("B"));

        add_neighbour(&mut graph, &a, &b, &config).unwrap();

        assert!(graph.are_adjacent(&a, &b));
        assert!(graph.are_adjacent(&b, &a));
        assert_eq!(cost(&graph, "A", "B"), 1);
        assert_eq!(cost(&graph, "B", "A"), 1);
    }

    #[test]
    fn test_add_neighbour_rejects_self_loop() {
        let mut graph = TestGraph::new(&["A"]);
        let a = make_id("A");

        let err = add_neighbour(&mut graph, &a, &a, &RoutingConfig::default()).unwrap_err();
        assert_eq!(err, RoutingError::SelfLoop(a.clone()));
        assert!(graph.adjacencies(&a).is_empty());
    }

    #[test]
    fn test_add_neighbour_unknown_stop() {
        let mut graph = TestGraph::new(&["A"]);
        let ghost = make_id("Ghost");

        let err = add_neighbour(&mut graph, &make_id("A"), &ghost, &RoutingConfig::default())
            .unwrap_err();
        assert_eq!(err, RoutingError::unknown(&ghost));
    }

    #[test]
    fn test_add_neighbour_registers_adjacency_without_improvement() {
        let mut graph = TestGraph::new(&["A", "B", "C"]);
        let (a, b, c) = (make_id("A"), make_id("B"), make_id("C"));
        graph.set_weight("A", "C", 10);

        // A-B-C gives A a cost of 2 to C before the direct edge exists
        add_neighbour(&mut graph, &a, &b, &RoutingConfig::default()).unwrap();
        add_neighbour(&mut graph, &b, &c, &RoutingConfig::default()).unwrap();
        assert_eq!(cost(&graph, "A", "C"), 2);

        add_neighbour(&mut graph, &a, &c, &RoutingConfig::default()).unwrap();

        assert!(graph.are_adjacent(&a, &c));
        assert_eq!(cost(&graph, "A", "C"), 2);
        assert_eq!(graph.tables[&a].next_stop(Some(&c)), Some(&b));
    }

    #[test]
    fn test_transfer_requires_adjacency() {
        let mut graph = TestGraph::new(&["A", "B"]);
        let (a, b) = (make_id("A"), make_id("B"));

        let err = transfer_entries(&mut graph, &a, &b).unwrap_err();
        assert_eq!(
            err,
            RoutingError::InvariantViolation {
                from: a.clone(),
                to: b.clone()
            }
        );
        assert_eq!(graph.tables[&b].len(), 1);
    }

    #[test]
    fn test_transfer_reports_any_change() {
        let mut graph = TestGraph::new(&["A", "B", "C", "D"]);
        let (a, b, c, d) = (make_id("A"), make_id("B"), make_id("C"), make_id("D"));
        graph.add_adjacency(&a, &b);

        // A knows C (improvable) and D (not improvable for B)
        let table_a = graph.tables.get_mut(&a).unwrap();
        table_a.add_or_update_entry(c.clone(), 2, c.clone());
        table_a.add_or_update_entry(d.clone(), 50, d.clone());
        let table_b = graph.tables.get_mut(&b).unwrap();
        table_b.add_or_update_entry(c.clone(), 10, c.clone());
        table_b.add_or_update_entry(d.clone(), 1, d.clone());

        // Destination order is A, B, C, D: the last offer (D) is rejected,
        // but the earlier A and C offers still count as changes
        assert!(transfer_entries(&mut graph, &a, &b).unwrap());
        assert_eq!(cost(&graph, "B", "C"), 3);
        assert_eq!(graph.tables[&b].next_stop(Some(&c)), Some(&a));
        assert_eq!(cost(&graph, "B", "D"), 1);

        // Nothing left to teach B
        assert!(!transfer_entries(&mut graph, &a, &b).unwrap());
    }

    #[test]
    fn test_traverse_network_order_and_reach() {
        let mut graph = TestGraph::new(&["A", "B", "C", "D", "E"]);
        let ids: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|n| make_id(n)).collect();
        // A-C, A-B, B-D, C-D; E isolated
        graph.add_adjacency(&ids[0], &ids[2]);
        graph.add_adjacency(&ids[0], &ids[1]);
        graph.add_adjacency(&ids[1], &ids[3]);
        graph.add_adjacency(&ids[2], &ids[3]);

        let order = traverse_network(&graph, &ids[0]).unwrap();
        assert_eq!(order, vec![ids[0].clone(), ids[1].clone(), ids[3].clone(), ids[2].clone()]);

        let isolated = traverse_network(&graph, &ids[4]).unwrap();
        assert_eq!(isolated, vec![ids[4].clone()]);
    }

    #[test]
    fn test_traverse_unknown_start() {
        let graph = TestGraph::new(&["A"]);
        assert!(traverse_network(&graph, &make_id("Q")).is_err());
    }

    #[test]
    fn test_synchronise_line_and_fixed_point() {
        let mut graph = TestGraph::new(&["A", "B", "C", "D"]);
        let ids: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| make_id(n)).collect();
        for pair in ids.windows(2) {
            graph.add_adjacency(&pair[0], &pair[1]);
            graph
                .tables
                .get_mut(&pair[0])
                .unwrap()
                .add_or_update_entry(pair[1].clone(), 1, pair[1].clone());
        }

        let report = synchronise(&mut graph, &ids[0], &RoutingConfig::default()).unwrap();
        assert!(report.updates > 0);
        assert!(report.passes >= 2);
        assert_eq!(cost(&graph, "A", "D"), 3);
        assert_eq!(cost(&graph, "D", "A"), 3);
        assert_eq!(graph.tables[&ids[3]].next_stop(Some(&ids[0])), Some(&ids[2]));

        let again = synchronise(&mut graph, &ids[3], &RoutingConfig::default()).unwrap();
        assert!(again.is_quiescent());
        assert_eq!(again.passes, 1);
    }

    #[test]
    fn test_synchronise_pass_limit() {
        let mut graph = TestGraph::new(&["A", "B", "C", "D", "E"]);
        let ids: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|n| make_id(n)).collect();
        for pair in ids.windows(2) {
            graph.add_adjacency(&pair[0], &pair[1]);
        }

        let err = synchronise(&mut graph, &ids[0], &RoutingConfig::bounded(1)).unwrap_err();
        assert_eq!(err, RoutingError::ConvergenceLimit { passes: 1 });

        // Without the cap the same graph converges
        let report = synchronise(&mut graph, &ids[0], &RoutingConfig::default()).unwrap();
        assert_eq!(cost(&graph, "A", "E"), 4);
        assert!(report.passes >= 1);
    }

    #[test]
    fn test_add_neighbour_keeps_edge_after_pass_limit() {
        let mut graph = TestGraph::new(&["A", "B", "C"]);
        let (a, b, c) = (make_id("A"), make_id("B"), make_id("C"));
        add_neighbour(&mut graph, &a, &b, &RoutingConfig::default()).unwrap();

        let err = add_neighbour(&mut graph, &b, &c, &RoutingConfig::bounded(1)).unwrap_err();
        assert_eq!(err, RoutingError::ConvergenceLimit { passes: 1 });

        // Edge and direct entry survive the failed run
        assert!(graph.are_adjacent(&b, &c));
        assert_eq!(cost(&graph, "B", "C"), 1);

        // An uncapped run finishes the job
        synchronise(&mut graph, &b, &RoutingConfig::default()).unwrap();
        assert_eq!(cost(&graph, "A", "C"), 2);
        assert_eq!(cost(&graph, "C", "A"), 2);
        assert_eq!(graph.tables[&c].next_stop(Some(&a)), Some(&b));
    }

    #[test]
    fn test_synchronise_with_table_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();

        let build = |config: &RoutingConfig| {
            let mut graph = TestGraph::new(&["A", "B", "C"]);
            let ids: Vec<_> = ["A", "B", "C"].iter().map(|n| make_id(n)).collect();
            add_neighbour(&mut graph, &ids[0], &ids[1], config).unwrap();
            add_neighbour(&mut graph, &ids[1], &ids[2], config).unwrap();
            let report = synchronise(&mut graph, &ids[0], config).unwrap();
            (graph.tables, report)
        };

        let plain = build(&RoutingConfig::default());
        let logged = tracing::subscriber::with_default(subscriber, || {
            build(&RoutingConfig::default().with_table_logging(true))
        });

        // Dumping tables does not change what converges
        assert_eq!(logged, plain);
        assert!(logged.1.is_quiescent());
    }
}

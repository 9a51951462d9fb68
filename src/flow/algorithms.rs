//! Maximum flow algorithms over [`FlowNetwork`].
//!
//! | Method | Complexity |
//! |--------|-----------|
//! | Ford–Fulkerson (DFS augmenting paths) | O(E · f) |
//! | Edmonds–Karp (BFS augmenting paths) | O(V · E²) |
//! | Dinic (blocking flows on level graphs) | O(V² · E) |
//! | Preflow-push (FIFO push-relabel) | O(V³) |
//! | Shortest augmenting path (distance labels) | O(V² · E) |
//!
//! Residual capacities below [`EPS`] count as saturated.
//!
//! # References
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 26
//! - Goldberg & Tarjan (1988), "A new approach to the maximum-flow problem"
//! - Ahuja & Orlin (1991), "Distance-directed augmenting path algorithms for
//!   maximum flow and parametric maximum flow problems"

use std::collections::VecDeque;

use super::network::{EdgeId, FlowNetwork};
use crate::EPS;

const UNREACHED: usize = usize::MAX;

/// Pushes the bottleneck amount along the path recorded in `parent`.
fn augment_path(network: &mut FlowNetwork, parent: &[Option<EdgeId>], sink: usize) -> f64 {
    let mut bottleneck = f64::INFINITY;
    let mut node = sink;
    while let Some(e) = parent[node] {
        bottleneck = bottleneck.min(network.residual(e));
        node = network.edges[e ^ 1].to;
    }

    node = sink;
    while let Some(e) = parent[node] {
        network.push(e, bottleneck);
        node = network.edges[e ^ 1].to;
    }

    bottleneck
}

pub(crate) fn edmonds_karp(network: &mut FlowNetwork, source: usize, sink: usize) -> f64 {
    let n = network.node_count();
    let mut total = 0.0;

    loop {
        let mut parent: Vec<Option<EdgeId>> = vec![None; n];
        let mut visited = vec![false; n];
        visited[source] = true;
        let mut queue = VecDeque::from([source]);

        while let Some(u) = queue.pop_front() {
            if u == sink {
                break;
            }
            for &e in &network.adjacency[u] {
                let v = network.edges[e].to;
                if !visited[v] && network.has_residual(e) {
                    visited[v] = true;
                    parent[v] = Some(e);
                    queue.push_back(v);
                }
            }
        }

        if !visited[sink] {
            break;
        }
        total += augment_path(network, &parent, sink);
    }

    total
}

pub(crate) fn ford_fulkerson(network: &mut FlowNetwork, source: usize, sink: usize) -> f64 {
    let n = network.node_count();
    let mut total = 0.0;

    loop {
        let mut parent: Vec<Option<EdgeId>> = vec![None; n];
        let mut visited = vec![false; n];
        visited[source] = true;
        let mut stack = vec![source];

        while let Some(u) = stack.pop() {
            if u == sink {
                break;
            }
            // Reverse push keeps the adjacency order on the DFS frontier.
            for &e in network.adjacency[u].iter().rev() {
                let v = network.edges[e].to;
                if !visited[v] && network.has_residual(e) {
                    visited[v] = true;
                    parent[v] = Some(e);
                    stack.push(v);
                }
            }
        }

        if !visited[sink] {
            break;
        }
        total += augment_path(network, &parent, sink);
    }

    total
}

pub(crate) fn dinic(network: &mut FlowNetwork, source: usize, sink: usize) -> f64 {
    let n = network.node_count();
    let mut total = 0.0;

    loop {
        let level = bfs_levels(network, source);
        if level[sink] == UNREACHED {
            break;
        }

        let mut next = vec![0usize; n];
        loop {
            let pushed = blocking_flow(network, source, sink, f64::INFINITY, &level, &mut next);
            if pushed <= EPS {
                break;
            }
            total += pushed;
        }
    }

    total
}

fn bfs_levels(network: &FlowNetwork, source: usize) -> Vec<usize> {
    let mut level = vec![UNREACHED; network.node_count()];
    level[source] = 0;
    let mut queue = VecDeque::from([source]);

    while let Some(u) = queue.pop_front() {
        for &e in &network.adjacency[u] {
            let v = network.edges[e].to;
            if level[v] == UNREACHED && network.has_residual(e) {
                level[v] = level[u] + 1;
                queue.push_back(v);
            }
        }
    }

    level
}

fn blocking_flow(
    network: &mut FlowNetwork,
    u: usize,
    sink: usize,
    limit: f64,
    level: &[usize],
    next: &mut [usize],
) -> f64 {
    if u == sink {
        return limit;
    }

    while next[u] < network.adjacency[u].len() {
        let e = network.adjacency[u][next[u]];
        let v = network.edges[e].to;
        if level[v] == level[u] + 1 && network.has_residual(e) {
            let pushed = blocking_flow(
                network,
                v,
                sink,
                limit.min(network.residual(e)),
                level,
                next,
            );
            if pushed > EPS {
                network.push(e, pushed);
                return pushed;
            }
        }
        next[u] += 1;
    }

    0.0
}

pub(crate) fn preflow_push(network: &mut FlowNetwork, source: usize, sink: usize) -> f64 {
    let n = network.node_count();
    let mut height = vec![0usize; n];
    let mut excess = vec![0.0f64; n];
    let mut queued = vec![false; n];
    let mut active = VecDeque::new();
    height[source] = n;

    for i in 0..network.adjacency[source].len() {
        let e = network.adjacency[source][i];
        let amount = network.residual(e);
        if amount > EPS {
            let v = network.edges[e].to;
            network.push(e, amount);
            excess[v] += amount;
            excess[source] -= amount;
            if v != sink && !queued[v] {
                queued[v] = true;
                active.push_back(v);
            }
        }
    }

    while let Some(u) = active.pop_front() {
        queued[u] = false;

        while excess[u] > EPS {
            for i in 0..network.adjacency[u].len() {
                if excess[u] <= EPS {
                    break;
                }
                let e = network.adjacency[u][i];
                let v = network.edges[e].to;
                if height[u] == height[v] + 1 && network.has_residual(e) {
                    let amount = excess[u].min(network.residual(e));
                    network.push(e, amount);
                    excess[u] -= amount;
                    excess[v] += amount;
                    if v != source && v != sink && !queued[v] {
                        queued[v] = true;
                        active.push_back(v);
                    }
                }
            }

            if excess[u] > EPS {
                let lowest = network.adjacency[u]
                    .iter()
                    .filter(|&&e| network.has_residual(e))
                    .map(|&e| height[network.edges[e].to])
                    .min();
                match lowest {
                    Some(h) if h + 1 < 2 * n => height[u] = h + 1,
                    // Excess below tolerance that cannot move anywhere.
                    _ => break,
                }
            }
        }
    }

    excess[sink]
}

pub(crate) fn shortest_augmenting_path(
    network: &mut FlowNetwork,
    source: usize,
    sink: usize,
) -> f64 {
    let n = network.node_count();
    let mut dist: Vec<usize> = distances_to(network, sink)
        .into_iter()
        .map(|d| d.min(n))
        .collect();
    let mut count = vec![0usize; n + 1];
    for &d in &dist {
        count[d] += 1;
    }

    let mut current = vec![0usize; n];
    let mut parent: Vec<Option<EdgeId>> = vec![None; n];
    let mut total = 0.0;
    let mut u = source;

    while dist[source] < n {
        if u == sink {
            total += augment_path(network, &parent, sink);
            u = source;
            continue;
        }

        let mut advanced = false;
        while current[u] < network.adjacency[u].len() {
            let e = network.adjacency[u][current[u]];
            let v = network.edges[e].to;
            if dist[u] == dist[v] + 1 && network.has_residual(e) {
                parent[v] = Some(e);
                u = v;
                advanced = true;
                break;
            }
            current[u] += 1;
        }
        if advanced {
            continue;
        }

        // Retreat: relabel u and step back along the path.
        let old = dist[u];
        count[old] -= 1;
        if count[old] == 0 {
            // Gap: nothing at distance `old` is left, so the sink is cut off.
            break;
        }
        let relabeled = network.adjacency[u]
            .iter()
            .filter(|&&e| network.has_residual(e))
            .map(|&e| dist[network.edges[e].to] + 1)
            .min()
            .unwrap_or(n)
            .min(n);
        dist[u] = relabeled;
        count[relabeled] += 1;
        current[u] = 0;
        // The source never gets a parent edge.
        if let Some(e) = parent[u] {
            u = network.edges[e ^ 1].to;
        }
    }

    total
}

/// Residual BFS distances from every node to `sink`.
fn distances_to(network: &FlowNetwork, sink: usize) -> Vec<usize> {
    let mut dist = vec![UNREACHED; network.node_count()];
    dist[sink] = 0;
    let mut queue = VecDeque::from([sink]);

    while let Some(v) = queue.pop_front() {
        for &e in &network.adjacency[v] {
            let w = network.edges[e].to;
            if dist[w] == UNREACHED && network.has_residual(e ^ 1) {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowMethod;

    const METHODS: [FlowMethod; 5] = [
        FlowMethod::EdmondsKarp,
        FlowMethod::FordFulkerson,
        FlowMethod::Dinic,
        FlowMethod::PreflowPush,
        FlowMethod::ShortestAugmentingPath,
    ];

    /// CLRS Figure 26.1, max flow 23.
    fn clrs_network() -> FlowNetwork {
        let mut g = FlowNetwork::new(6);
        g.add_edge(0, 1, 16.0);
        g.add_edge(0, 2, 13.0);
        g.add_edge(2, 1, 4.0);
        g.add_edge(1, 3, 12.0);
        g.add_edge(3, 2, 9.0);
        g.add_edge(2, 4, 14.0);
        g.add_edge(4, 3, 7.0);
        g.add_edge(3, 5, 20.0);
        g.add_edge(4, 5, 4.0);
        g
    }

    fn assert_conservation(g: &FlowNetwork, source: usize, sink: usize) {
        for node in 0..g.node_count() {
            if node != source && node != sink {
                assert!(g.outflow(node).abs() < 1e-9, "node {node} leaks flow");
            }
        }
        for e in (0..g.edges.len()).step_by(2) {
            assert!(g.flow(e) <= g.capacity(e) + 1e-9);
            assert!(g.flow(e) >= -1e-9);
        }
    }

    #[test]
    fn test_clrs_network_all_methods() {
        for method in METHODS {
            let mut g = clrs_network();
            let value = g.max_flow(0, 5, method);
            assert!((value - 23.0).abs() < 1e-9, "{method:?} gave {value}");
            assert!((g.outflow(0) - 23.0).abs() < 1e-9);
            assert_conservation(&g, 0, 5);
        }
    }

    #[test]
    fn test_fractional_capacities() {
        for method in METHODS {
            let mut g = FlowNetwork::new(4);
            g.add_edge(0, 1, 1.5);
            g.add_edge(0, 2, 0.25);
            g.add_edge(1, 3, 1.0);
            g.add_edge(2, 3, 2.0);
            g.add_edge(1, 2, 0.75);
            let value = g.max_flow(0, 3, method);
            assert!((value - 1.75).abs() < 1e-9, "{method:?} gave {value}");
            assert_conservation(&g, 0, 3);
        }
    }

    #[test]
    fn test_disconnected_sink() {
        for method in METHODS {
            let mut g = FlowNetwork::new(4);
            g.add_edge(0, 1, 5.0);
            g.add_edge(2, 3, 5.0);
            assert_eq!(g.max_flow(0, 3, method), 0.0);
            assert_conservation(&g, 0, 3);
        }
    }

    #[test]
    fn test_excess_returns_to_source() {
        // Node 1 receives more than it can forward; preflow-push must send it back.
        for method in METHODS {
            let mut g = FlowNetwork::new(3);
            let e = g.add_edge(0, 1, 10.0);
            g.add_edge(1, 2, 3.0);
            let value = g.max_flow(0, 2, method);
            assert!((value - 3.0).abs() < 1e-9);
            assert!((g.flow(e) - 3.0).abs() < 1e-9, "{method:?}");
        }
    }

    #[test]
    fn test_shortest_augmenting_path_stops_at_gap() {
        // 0 -> 2 is a dead end; once 1 -> 3 saturates, no node is left at distance 1.
        let mut g = FlowNetwork::new(4);
        g.add_edge(0, 2, 4.0);
        g.add_edge(0, 1, 2.0);
        g.add_edge(1, 3, 1.5);
        let value = g.max_flow(0, 3, FlowMethod::ShortestAugmentingPath);
        assert!((value - 1.5).abs() < 1e-9);
        assert_conservation(&g, 0, 3);
    }
}

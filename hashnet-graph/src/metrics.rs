use std::collections::HashSet;

use petgraph::algo::connected_components;
use petgraph::Direction;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::SocialGraph;

/// Whole-graph statistics reported for each of the three graphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphMetrics {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub weakly_connected: bool,
    pub average_clustering: f64,
    pub avg_in_degree: f64,
    pub avg_out_degree: f64,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}

impl GraphMetrics {
    /// `None` for an empty graph.
    pub fn compute(graph: &SocialGraph) -> Option<Self> {
        let n = graph.node_count();
        if n == 0 {
            warn!(graph = %graph.kind(), "graph.metrics.empty");
            return None;
        }
        let m = graph.edge_count();

        let density = if n < 2 {
            0.0
        } else {
            m as f64 / (n as f64 * (n as f64 - 1.0))
        };

        let inner = graph.inner();
        let in_degrees: Vec<usize> = inner.node_indices().map(|ix| graph.in_degree(ix)).collect();
        let out_degrees: Vec<usize> = inner.node_indices().map(|ix| graph.out_degree(ix)).collect();

        let metrics = Self {
            nodes: n,
            edges: m,
            density,
            weakly_connected: connected_components(inner) == 1,
            average_clustering: average_clustering(graph),
            avg_in_degree: in_degrees.iter().sum::<usize>() as f64 / n as f64,
            avg_out_degree: out_degrees.iter().sum::<usize>() as f64 / n as f64,
            max_in_degree: in_degrees.iter().copied().max().unwrap_or(0),
            max_out_degree: out_degrees.iter().copied().max().unwrap_or(0),
        };

        info!(
            graph = %graph.kind(),
            nodes = metrics.nodes,
            edges = metrics.edges,
            density = metrics.density,
            weakly_connected = metrics.weakly_connected,
            "graph.metrics"
        );
        Some(metrics)
    }
}

/// Undirected neighbour sets with self-loops dropped.
fn undirected_neighbours(graph: &SocialGraph) -> Vec<HashSet<usize>> {
    let outgoing = graph.adjacency(Direction::Outgoing);
    let incoming = graph.adjacency(Direction::Incoming);
    outgoing
        .into_iter()
        .zip(incoming)
        .enumerate()
        .map(|(v, (out, inc))| out.into_iter().chain(inc).filter(|&u| u != v).collect())
        .collect()
}

/// Mean local clustering coefficient of the undirected projection.
/// Nodes with fewer than two neighbours contribute 0.
pub fn average_clustering(graph: &SocialGraph) -> f64 {
    let nbrs = undirected_neighbours(graph);
    if nbrs.is_empty() {
        return 0.0;
    }

    let total: f64 = nbrs
        .iter()
        .map(|vs| {
            let k = vs.len();
            if k < 2 {
                return 0.0;
            }
            // each triangle through v is seen twice
            let links: usize = vs
                .iter()
                .map(|u| nbrs[*u].iter().filter(|w| vs.contains(*w)).count())
                .sum();
            links as f64 / (k as f64 * (k as f64 - 1.0))
        })
        .sum();

    total / nbrs.len() as f64
}

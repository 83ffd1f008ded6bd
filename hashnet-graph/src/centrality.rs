//! Node rankings.
//!
//! All measures are unweighted and follow the directed-graph conventions of
//! the common network analysis toolkits: betweenness by Brandes' algorithm,
//! closeness over incoming distances with the Wasserman-Faust correction, and
//! eigenvector centrality by power iteration on `A + I` over in-edges.
use std::collections::VecDeque;
use std::fmt;

use hashnet_common::{HashnetError, Result};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::SocialGraph;

pub const EIGENVECTOR_MAX_ITER: usize = 1000;
pub const EIGENVECTOR_TOL: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centrality {
    /// In-degree.
    Degree,
    Betweenness,
    Closeness,
    Eigenvector,
}

impl Centrality {
    pub const ALL: [Centrality; 4] = [
        Centrality::Degree,
        Centrality::Betweenness,
        Centrality::Closeness,
        Centrality::Eigenvector,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Centrality::Degree => "degree",
            Centrality::Betweenness => "betweenness",
            Centrality::Closeness => "closeness",
            Centrality::Eigenvector => "eigenvector",
        }
    }
}

impl fmt::Display for Centrality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeScore {
    pub id: String,
    pub score: f64,
}

/// The `n` highest-scoring nodes, score descending, ties by id ascending.
pub fn top_nodes(graph: &SocialGraph, measure: Centrality, n: usize) -> Result<Vec<NodeScore>> {
    if graph.is_empty() || n == 0 {
        return Ok(Vec::new());
    }

    let scores = match measure {
        Centrality::Degree => in_degree(graph),
        Centrality::Betweenness => betweenness(graph),
        Centrality::Closeness => closeness(graph),
        Centrality::Eigenvector => eigenvector(graph)?,
    };

    let mut ranked: Vec<NodeScore> = scores
        .into_iter()
        .enumerate()
        .map(|(i, score)| NodeScore {
            id: graph.id_at(i).to_string(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(n);

    debug!(graph = %graph.kind(), %measure, returned = ranked.len(), "graph.top_nodes");
    Ok(ranked)
}

pub fn in_degree(graph: &SocialGraph) -> Vec<f64> {
    graph
        .adjacency(Direction::Incoming)
        .iter()
        .map(|inc| inc.len() as f64)
        .collect()
}

/// Normalized by `1 / ((n - 1)(n - 2))` when `n > 2`.
pub fn betweenness(graph: &SocialGraph) -> Vec<f64> {
    let out = graph.adjacency(Direction::Outgoing);
    let n = out.len();
    let mut cb = vec![0.0f64; n];

    let mut stack = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];

    for s in 0..n {
        stack.clear();
        queue.clear();
        pred.iter_mut().for_each(Vec::clear);
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &out[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    pred[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &pred[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        cb.iter_mut().for_each(|c| *c *= scale);
    }
    cb
}

/// Closeness over incoming distances: how easily a node is reached.
pub fn closeness(graph: &SocialGraph) -> Vec<f64> {
    let inc = graph.adjacency(Direction::Incoming);
    let n = inc.len();
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::with_capacity(n);

    (0..n)
        .map(|v| {
            dist.fill(usize::MAX);
            queue.clear();
            dist[v] = 0;
            queue.push_back(v);

            let mut reached = 0usize;
            let mut total = 0usize;
            while let Some(u) = queue.pop_front() {
                reached += 1;
                total += dist[u];
                for &w in &inc[u] {
                    if dist[w] == usize::MAX {
                        dist[w] = dist[u] + 1;
                        queue.push_back(w);
                    }
                }
            }

            if total == 0 || n < 2 {
                return 0.0;
            }
            let r = (reached - 1) as f64;
            (r / total as f64) * (r / (n as f64 - 1.0))
        })
        .collect()
}

pub fn eigenvector(graph: &SocialGraph) -> Result<Vec<f64>> {
    eigenvector_with(graph, EIGENVECTOR_MAX_ITER, EIGENVECTOR_TOL)
}

pub(crate) fn eigenvector_with(graph: &SocialGraph, max_iter: usize, tol: f64) -> Result<Vec<f64>> {
    let out = graph.adjacency(Direction::Outgoing);
    let n = out.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut x = vec![1.0 / n as f64; n];
    for iteration in 1..=max_iter {
        let last = x.clone();
        for (v, targets) in out.iter().enumerate() {
            for &w in targets {
                x[w] += last[v];
            }
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        x.iter_mut().for_each(|v| *v /= norm);

        let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n as f64 * tol {
            debug!(graph = %graph.kind(), iteration, "graph.eigenvector.converged");
            return Ok(x);
        }
    }

    Err(HashnetError::Convergence {
        algorithm: "eigenvector centrality",
        iterations: max_iter,
    })
}

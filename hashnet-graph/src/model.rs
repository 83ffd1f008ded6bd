use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Hashtag,
    User,
}

/// Which of the three graphs a [`SocialGraph`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    HashtagCooccurrence,
    Mention,
    UserHashtag,
}

impl GraphKind {
    pub const ALL: [GraphKind; 3] = [
        GraphKind::HashtagCooccurrence,
        GraphKind::Mention,
        GraphKind::UserHashtag,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GraphKind::HashtagCooccurrence => "Hashtag Co-occurrence Graph",
            GraphKind::Mention => "User Mention Graph",
            GraphKind::UserHashtag => "User-Hashtag Graph",
        }
    }

    /// Short name used for file names (`hashtag_graph.json`, ...).
    pub fn slug(&self) -> &'static str {
        match self {
            GraphKind::HashtagCooccurrence => "hashtag",
            GraphKind::Mention => "mention",
            GraphKind::UserHashtag => "user_hashtag",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
}

/// Weighted directed graph keyed by node identifier.
///
/// Nodes are never removed, so `NodeIndex::index()` is a dense `0..n` range
/// that the analysis code uses for flat score vectors.
#[derive(Debug, Clone)]
pub struct SocialGraph {
    kind: GraphKind,
    graph: DiGraph<GraphNode, u64>,
    index: HashMap<String, NodeIndex>,
}

impl SocialGraph {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn inner(&self) -> &DiGraph<GraphNode, u64> {
        &self.graph
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn ensure_node(&mut self, id: &str, kind: NodeKind) -> NodeIndex {
        if let Some(ix) = self.index.get(id) {
            return *ix;
        }
        let ix = self.graph.add_node(GraphNode {
            id: id.to_string(),
            kind,
        });
        self.index.insert(id.to_string(), ix);
        ix
    }

    /// Add the edge `source -> target` with weight 1, or bump an existing one
    /// by 1. Returns the new weight.
    pub fn add_or_increment(
        &mut self,
        (source, source_kind): (&str, NodeKind),
        (target, target_kind): (&str, NodeKind),
    ) -> u64 {
        let a = self.ensure_node(source, source_kind);
        let b = self.ensure_node(target, target_kind);
        match self.graph.find_edge(a, b) {
            Some(e) => {
                let w = &mut self.graph[e];
                *w += 1;
                *w
            }
            None => {
                self.graph.add_edge(a, b, 1);
                1
            }
        }
    }

    pub fn weight(&self, source: &str, target: &str) -> Option<u64> {
        let a = self.node_index(source)?;
        let b = self.node_index(target)?;
        self.graph.find_edge(a, b).map(|e| self.graph[e])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.graph.node_weights()
    }

    /// `(source, target, weight)` for every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                *e.weight(),
            )
        })
    }

    pub fn in_degree(&self, ix: NodeIndex) -> usize {
        self.graph.edges_directed(ix, Direction::Incoming).count()
    }

    pub fn out_degree(&self, ix: NodeIndex) -> usize {
        self.graph.edges_directed(ix, Direction::Outgoing).count()
    }

    /// In-degree plus out-degree; a self-loop counts twice.
    pub fn degree(&self, ix: NodeIndex) -> usize {
        self.in_degree(ix) + self.out_degree(ix)
    }

    /// Dense adjacency lists indexed by `NodeIndex::index()`.
    pub(crate) fn adjacency(&self, dir: Direction) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|ix| {
                self.graph
                    .neighbors_directed(ix, dir)
                    .map(|n| n.index())
                    .collect()
            })
            .collect()
    }

    pub(crate) fn id_at(&self, i: usize) -> &str {
        &self.graph[NodeIndex::new(i)].id
    }
}

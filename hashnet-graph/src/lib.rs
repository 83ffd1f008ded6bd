//! Graph construction and analysis for collected posts.
//!
//! Posts are folded into three weighted directed graphs (hashtag
//! co-occurrence, user mentions, user-hashtag usage) backed by `petgraph`.
//! [`metrics`] and [`centrality`] compute whole-graph statistics and node
//! rankings; [`export`] writes each graph as stable JSON.
//!
//! ```rust
//! use hashnet_common::Post;
//! use hashnet_graph::{build_all, BuildOptions, Centrality, GraphMetrics, top_nodes};
//!
//! let posts = vec![
//!     Post::builder("1", "alice", "").hashtags(["#rust", "#async"]).mentions(["bob"]).build(),
//!     Post::builder("2", "bob", "").hashtags(["#async", "#rust"]).build(),
//! ];
//! let set = build_all(&posts, BuildOptions::default());
//! assert_eq!(set.hashtag.weight("#async", "#rust"), Some(2));
//!
//! let metrics = GraphMetrics::compute(&set.user_hashtag).unwrap();
//! assert_eq!(metrics.nodes, 4);
//!
//! let top = top_nodes(&set.hashtag, Centrality::Degree, 1).unwrap();
//! assert_eq!(top[0].id, "#rust");
//! ```
pub mod builder;
pub mod centrality;
pub mod export;
pub mod metrics;
pub mod model;

pub use builder::{
    build_all, build_hashtag_graph, build_mention_graph, build_user_hashtag_graph, BuildOptions,
    GraphSet,
};
pub use centrality::{top_nodes, Centrality, NodeScore};
pub use export::{export_all, ExportEdge, ExportNode, GraphExport};
pub use metrics::GraphMetrics;
pub use model::{GraphKind, GraphNode, NodeKind, SocialGraph};

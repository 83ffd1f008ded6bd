//! Posts to graphs.
//!
//! Every builder is a pure fold over the post slice: the same posts always
//! produce the same nodes, edges and weights, whatever order they arrive in.
//! Nodes only enter a graph through an edge.
use std::collections::{BTreeSet, HashSet};

use hashnet_common::{HashnetError, Post, Result};
use tracing::{info, warn};

use crate::model::{GraphKind, NodeKind, SocialGraph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Increment both `a -> b` and `b -> a` for each co-occurring pair
    /// instead of only the lexicographically ordered direction.
    pub symmetric_cooccurrence: bool,
}

/// Distinct tokens of one post in first-seen order.
fn distinct<'a>(tokens: &'a [String]) -> Vec<&'a str> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .collect()
}

pub fn build_hashtag_graph(posts: &[Post], opts: BuildOptions) -> SocialGraph {
    let mut g = SocialGraph::new(GraphKind::HashtagCooccurrence);
    let tag = NodeKind::Hashtag;

    for post in posts {
        // sorted so the pair loop yields (smaller, larger)
        let tags: BTreeSet<&str> = distinct(&post.hashtags).into_iter().collect();
        let tags: Vec<&str> = tags.into_iter().collect();
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                g.add_or_increment((*a, tag), (*b, tag));
                if opts.symmetric_cooccurrence {
                    g.add_or_increment((*b, tag), (*a, tag));
                }
            }
        }
    }

    info!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        symmetric = opts.symmetric_cooccurrence,
        "graph.build.hashtag"
    );
    g
}

pub fn build_mention_graph(posts: &[Post]) -> SocialGraph {
    let mut g = SocialGraph::new(GraphKind::Mention);
    let user = NodeKind::User;

    for post in posts {
        let mut seen = HashSet::with_capacity(post.mentions.len());
        for mentioned in &post.mentions {
            let mentioned = mentioned.trim_start_matches('@');
            if mentioned.is_empty() || !seen.insert(mentioned) {
                continue;
            }
            g.add_or_increment((post.author_id.as_str(), user), (mentioned, user));
        }
    }

    info!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "graph.build.mention"
    );
    g
}

pub fn build_user_hashtag_graph(posts: &[Post]) -> SocialGraph {
    let mut g = SocialGraph::new(GraphKind::UserHashtag);

    for post in posts {
        for tag in distinct(&post.hashtags) {
            g.add_or_increment(
                (post.author_id.as_str(), NodeKind::User),
                (tag, NodeKind::Hashtag),
            );
        }
    }

    info!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "graph.build.user_hashtag"
    );
    g
}

/// The three graphs built from one post collection.
#[derive(Debug, Clone)]
pub struct GraphSet {
    pub hashtag: SocialGraph,
    pub mention: SocialGraph,
    pub user_hashtag: SocialGraph,
}

impl GraphSet {
    pub fn get(&self, kind: GraphKind) -> &SocialGraph {
        match kind {
            GraphKind::HashtagCooccurrence => &self.hashtag,
            GraphKind::Mention => &self.mention,
            GraphKind::UserHashtag => &self.user_hashtag,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SocialGraph> + '_ {
        GraphKind::ALL.into_iter().map(|k| self.get(k))
    }

    /// Distinct node identifiers across all three graphs.
    pub fn distinct_nodes(&self) -> usize {
        let ids: HashSet<&str> = self
            .iter()
            .flat_map(|g| g.nodes().map(|n| n.id.as_str()))
            .collect();
        ids.len()
    }

    /// Fail with [`HashnetError::InsufficientData`] below `required` distinct nodes.
    pub fn ensure_min_nodes(&self, required: usize) -> Result<usize> {
        let found = self.distinct_nodes();
        if found < required {
            warn!(found, required, "graph.min_nodes.unmet");
            return Err(HashnetError::InsufficientData { required, found });
        }
        Ok(found)
    }
}

pub fn build_all(posts: &[Post], opts: BuildOptions) -> GraphSet {
    GraphSet {
        hashtag: build_hashtag_graph(posts, opts),
        mention: build_mention_graph(posts),
        user_hashtag: build_user_hashtag_graph(posts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, author: &str, tags: &[&str], mentions: &[&str]) -> Post {
        Post::builder(id, author, "")
            .hashtags(tags.iter().copied())
            .mentions(mentions.iter().copied())
            .build()
    }

    #[test]
    fn cooccurrence_uses_canonical_direction() {
        let posts = [post("1", "u", &["#b", "#a"], &[])];
        let g = build_hashtag_graph(&posts, BuildOptions::default());
        assert_eq!(g.weight("#a", "#b"), Some(1));
        assert_eq!(g.weight("#b", "#a"), None);
    }

    #[test]
    fn symmetric_mode_increments_both_directions() {
        let posts = [post("1", "u", &["#a", "#b"], &[]), post("2", "u", &["#b", "#a"], &[])];
        let g = build_hashtag_graph(
            &posts,
            BuildOptions {
                symmetric_cooccurrence: true,
            },
        );
        assert_eq!(g.weight("#a", "#b"), Some(2));
        assert_eq!(g.weight("#b", "#a"), Some(2));
    }

    #[test]
    fn three_tags_make_three_pairs() {
        let posts = [post("1", "u", &["#c", "#a", "#b"], &[])];
        let g = build_hashtag_graph(&posts, BuildOptions::default());
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.weight("#a", "#c"), Some(1));
        assert_eq!(g.weight("#b", "#c"), Some(1));
    }

    #[test]
    fn duplicate_tags_in_one_post_count_once() {
        let posts = [post("1", "u", &["#a", "#b", "#a"], &[])];
        let g = build_hashtag_graph(&posts, BuildOptions::default());
        assert_eq!(g.weight("#a", "#b"), Some(1));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn single_tag_adds_no_cooccurrence() {
        let posts = [post("1", "u", &["#solo"], &[])];
        let g = build_hashtag_graph(&posts, BuildOptions::default());
        assert!(g.is_empty());
    }

    #[test]
    fn mentions_strip_at_sign() {
        let posts = [post("1", "u", &[], &["@Bob", "carol"])];
        let g = build_mention_graph(&posts);
        assert_eq!(g.weight("u", "Bob"), Some(1));
        assert_eq!(g.weight("u", "carol"), Some(1));
    }

    #[test]
    fn user_hashtag_edges_point_from_author() {
        let posts = [
            post("1", "u", &["#a"], &[]),
            post("2", "u", &["#a", "#b"], &[]),
        ];
        let g = build_user_hashtag_graph(&posts);
        assert_eq!(g.weight("u", "#a"), Some(2));
        assert_eq!(g.weight("u", "#b"), Some(1));
        assert_eq!(g.weight("#a", "u"), None);
    }

    #[test]
    fn min_nodes_counts_distinct_ids_across_graphs() {
        let posts = [post("1", "u", &["#a", "#b"], &["v"])];
        let set = build_all(&posts, BuildOptions::default());
        // #a, #b, u, v
        assert_eq!(set.distinct_nodes(), 4);
        assert_eq!(set.ensure_min_nodes(4).unwrap(), 4);

        match set.ensure_min_nodes(5) {
            Err(HashnetError::InsufficientData { required, found }) => {
                assert_eq!((required, found), (5, 4));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

use chrono::{TimeZone, Utc};
use hashnet_common::Post;
use hashnet_graph::{
    build_all, build_hashtag_graph, build_mention_graph, export_all, BuildOptions, GraphExport,
    GraphKind,
};

fn post(id: usize, author: &str, tags: &[&str], mentions: &[&str]) -> Post {
    Post::builder(id.to_string(), author, "")
        .created_at(Utc.timestamp_opt(1_756_000_000 + id as i64, 0).unwrap())
        .hashtags(tags.iter().copied())
        .mentions(mentions.iter().copied())
        .build()
}

fn sample() -> Vec<Post> {
    vec![
        post(1, "alice", &["#rust", "#async"], &["bob", "carol"]),
        post(2, "bob", &["#async", "#rust", "#tokio"], &["alice"]),
        post(3, "carol", &[], &[]),
        post(4, "alice", &["#rust"], &["bob"]),
        post(5, "dave", &["#tokio", "#rust"], &["dave"]),
    ]
}

fn snapshot(posts: &[Post]) -> Vec<GraphExport> {
    let set = build_all(posts, BuildOptions::default());
    set.iter().map(GraphExport::from_graph).collect()
}

#[test]
fn each_cooccurring_post_adds_exactly_one() {
    let posts = sample();
    let g = build_hashtag_graph(&posts, BuildOptions::default());
    assert_eq!(g.weight("#async", "#rust"), Some(2));
    assert_eq!(g.weight("#rust", "#tokio"), Some(2));
    assert_eq!(g.weight("#async", "#tokio"), Some(1));
    assert_eq!(g.weight("#rust", "#async"), None);
}

#[test]
fn mentions_become_author_edges() {
    let posts = sample();
    let g = build_mention_graph(&posts);
    assert_eq!(g.weight("alice", "bob"), Some(2));
    assert_eq!(g.weight("alice", "carol"), Some(1));
    assert_eq!(g.weight("bob", "alice"), Some(1));
    assert_eq!(g.weight("dave", "dave"), Some(1));
    assert_eq!(g.weight("carol", "alice"), None);
}

#[test]
fn posts_without_tokens_add_no_edges() {
    let posts = vec![post(1, "quiet", &[], &[])];
    let set = build_all(&posts, BuildOptions::default());
    assert_eq!(set.hashtag.edge_count(), 0);
    assert_eq!(set.mention.edge_count(), 0);
    assert_eq!(set.user_hashtag.edge_count(), 0);
    assert_eq!(set.distinct_nodes(), 0);
}

#[test]
fn rebuilding_is_deterministic() {
    let posts = sample();
    assert_eq!(snapshot(&posts), snapshot(&posts));
}

#[test]
fn post_order_does_not_change_weights() {
    let posts = sample();
    let mut reversed = posts.clone();
    reversed.reverse();
    assert_eq!(snapshot(&posts), snapshot(&reversed));

    let shuffled_tags: Vec<Post> = posts
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p.hashtags.reverse();
            p
        })
        .collect();
    assert_eq!(snapshot(&posts), snapshot(&shuffled_tags));
}

#[test]
fn thousand_fresh_pairs_reach_the_node_floor() {
    let tags: Vec<(String, String)> = (0..1000)
        .map(|i| (format!("#a{i}"), format!("#b{i}")))
        .collect();
    let posts: Vec<Post> = tags
        .iter()
        .enumerate()
        .map(|(i, (a, b))| post(i, &format!("user{i}"), &[a.as_str(), b.as_str()], &[]))
        .collect();

    let set = build_all(&posts, BuildOptions::default());
    assert!(set.hashtag.node_count() >= 1000);
    assert_eq!(set.hashtag.edge_count(), 1000);
    assert!(set.ensure_min_nodes(1000).is_ok());
}

#[test]
fn small_samples_fail_the_node_floor() {
    let set = build_all(&sample(), BuildOptions::default());
    let err = set.ensure_min_nodes(1000).unwrap_err();
    assert!(err.to_string().contains("1000 required"));
}

#[test]
fn exports_land_in_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested");
    let set = build_all(&sample(), BuildOptions::default());

    let written = export_all(&set, &out).unwrap();
    assert_eq!(written.len(), 3);

    let raw = std::fs::read_to_string(out.join("mention_graph.json")).unwrap();
    let parsed: GraphExport = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.kind, GraphKind::Mention);
    assert_eq!(parsed, GraphExport::from_graph(&set.mention));
}

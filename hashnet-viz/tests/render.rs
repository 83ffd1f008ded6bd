use chrono::{TimeZone, Utc};
use hashnet_common::{Engagement, Post};
use hashnet_graph::{build_all, BuildOptions, GraphKind, GraphMetrics, GraphSet};
use hashnet_store::{CollectionStats, EngagementSummary, TokenCount, UserActivity};
use hashnet_viz::{render_all, NetworkLayout, VizInput, DASHBOARD_FILE, NETWORK_NODES};

fn posts() -> Vec<Post> {
    (0..12u64)
        .map(|i| {
            Post::builder(i.to_string(), format!("user{}", i % 4), "")
                .created_at(Utc.with_ymd_and_hms(2025, 9, 1 + (i % 3) as u32, 12, 0, 0).unwrap())
                .hashtags([format!("#t{}", i % 5), format!("#t{}", (i + 1) % 5)])
                .mentions([format!("user{}", (i + 1) % 4)])
                .engagement(Engagement {
                    likes: i * 10,
                    reposts: i,
                    replies: i % 2,
                    quotes: 0,
                })
                .build()
        })
        .collect()
}

fn input<'a>(
    posts: &'a [Post],
    graphs: &'a GraphSet,
    tags: &'a [TokenCount],
    days: &'a [TokenCount],
    users: &'a [UserActivity],
) -> VizInput<'a> {
    VizInput {
        posts,
        graphs,
        stats: CollectionStats {
            total_posts: posts.len() as u64,
            unique_users: 4,
            unique_hashtags: 5,
            unique_mentions: 4,
        },
        engagement: EngagementSummary::default(),
        hashtag_counts: tags,
        daily_hashtags: days,
        users,
        metrics: graphs
            .iter()
            .map(|g| (g.kind(), GraphMetrics::compute(g)))
            .collect(),
        rankings: Vec::new(),
    }
}

#[test]
fn renders_every_chart_and_the_dashboard() {
    let tmp = tempfile::tempdir().unwrap();
    let posts = posts();
    let graphs = build_all(&posts, BuildOptions::default());
    let tags = vec![
        TokenCount { token: "#t1".into(), count: 5 },
        TokenCount { token: "#t2".into(), count: 3 },
    ];
    let days = vec![
        TokenCount { token: "2025-09-01".into(), count: 4 },
        TokenCount { token: "2025-09-02".into(), count: 4 },
    ];
    let users = vec![
        UserActivity {
            author_id: "user0".into(),
            posts: 3,
            avg_engagement: 12.5,
            avg_reposts: 2.5,
            avg_likes: 10.0,
            hashtags: 6,
            mentions: 3,
        },
        UserActivity {
            author_id: "user1".into(),
            posts: 1,
            avg_engagement: 4.0,
            avg_reposts: 1.0,
            avg_likes: 3.0,
            hashtags: 2,
            mentions: 0,
        },
    ];

    let written = render_all(input(&posts, &graphs, &tags, &days, &users), tmp.path()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    for expected in [
        "hashtag_degree_distribution.svg",
        "mention_degree_distribution.svg",
        "user_hashtag_degree_distribution.svg",
        "hashtag_network.svg",
        "mention_network.svg",
        "user_hashtag_network.svg",
        "hashtag_analysis.svg",
        "engagement_analysis.svg",
        "user_activity.svg",
        "user_analysis.svg",
        DASHBOARD_FILE,
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
        assert!(tmp.path().join(expected).exists());
    }

    let svg = std::fs::read_to_string(tmp.path().join("hashtag_analysis.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Top Hashtag Co-occurrence Network"));

    let users_svg = std::fs::read_to_string(tmp.path().join("user_analysis.svg")).unwrap();
    assert!(users_svg.contains("Top 2 Users by Post Count"));
    assert!(users_svg.contains("User Behavior: Hashtags vs Mentions"));

    // small graphs are drawn whole, with labels
    let mention_svg = std::fs::read_to_string(tmp.path().join("mention_network.svg")).unwrap();
    assert!(mention_svg.contains("user0"));

    let html = std::fs::read_to_string(tmp.path().join(DASHBOARD_FILE)).unwrap();
    assert!(html.contains("engagement_analysis.svg"));
    assert!(html.contains("hashtag_network.svg"));
    assert!(html.contains(&GraphKind::Mention.to_string()));
}

#[test]
fn empty_inputs_still_produce_a_dashboard() {
    let tmp = tempfile::tempdir().unwrap();
    let graphs = build_all(&[], BuildOptions::default());

    let written = render_all(input(&[], &graphs, &[], &[], &[]), tmp.path()).unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with(DASHBOARD_FILE));
}

#[test]
fn network_layout_is_capped_at_the_busiest_nodes() {
    let posts: Vec<Post> = (0..120u64)
        .map(|i| {
            Post::builder(i.to_string(), "hub", "")
                .mentions([format!("user{i}")])
                .build()
        })
        .collect();
    let graphs = build_all(&posts, BuildOptions::default());

    let layout = NetworkLayout::circular(&graphs.mention, NETWORK_NODES);
    assert_eq!(layout.nodes.len(), NETWORK_NODES);
    assert_eq!(layout.nodes[0].id, "hub");
    assert_eq!(layout.nodes[0].degree, 120);
    // only the hub links the drawn leaves
    assert_eq!(layout.edges.len(), NETWORK_NODES - 1);
    assert!(layout.edges.iter().all(|&(s, _, _)| s == 0));
}

//! Plain-text summary written at the end of a successful run.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use hashnet_graph::{GraphKind, GraphMetrics};
use hashnet_store::{CollectionStats, EngagementSummary};

pub const REPORT_FILE: &str = "analysis_report.txt";

#[derive(Debug, Clone)]
pub struct ReportData {
    pub generated_at: DateTime<Local>,
    pub stats: CollectionStats,
    pub engagement: EngagementSummary,
    pub metrics: Vec<(GraphKind, Option<GraphMetrics>)>,
    pub distinct_nodes: usize,
    pub min_nodes: usize,
    /// File names found in the output directory.
    pub files: Vec<String>,
}

/// `1234567` -> `1,234,567`.
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "-".repeat(title.len()));
}

pub fn render_report(data: &ReportData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SOCIAL NETWORK ANALYSIS REPORT");
    let _ = writeln!(out, "==============================");
    let _ = writeln!(
        out,
        "Generated on: {}",
        data.generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let s = &data.stats;
    section(&mut out, "DATASET OVERVIEW");
    let _ = writeln!(out, "Total Posts Collected: {}", thousands(s.total_posts));
    let _ = writeln!(out, "Unique Users: {}", thousands(s.unique_users));
    let _ = writeln!(out, "Unique Hashtags: {}", thousands(s.unique_hashtags));
    let _ = writeln!(out, "Unique Mentions: {}", thousands(s.unique_mentions));

    let e = &data.engagement;
    section(&mut out, "ENGAGEMENT METRICS");
    let _ = writeln!(out, "Average Reposts per Post: {:.2}", e.avg_reposts);
    let _ = writeln!(out, "Average Likes per Post: {:.2}", e.avg_likes);
    let _ = writeln!(out, "Average Replies per Post: {:.2}", e.avg_replies);
    let _ = writeln!(out, "Total Reposts: {}", thousands(e.total_reposts));
    let _ = writeln!(out, "Total Likes: {}", thousands(e.total_likes));

    section(&mut out, "GRAPH ANALYSIS");
    for (kind, metrics) in &data.metrics {
        let _ = writeln!(out, "{kind}:");
        match metrics {
            Some(m) => {
                let _ = writeln!(out, "  nodes: {}", m.nodes);
                let _ = writeln!(out, "  edges: {}", m.edges);
                let _ = writeln!(out, "  density: {:.4}", m.density);
                let _ = writeln!(out, "  weakly connected: {}", m.weakly_connected);
                let _ = writeln!(out, "  average clustering: {:.4}", m.average_clustering);
                let _ = writeln!(
                    out,
                    "  in-degree avg/max: {:.4} / {}",
                    m.avg_in_degree, m.max_in_degree
                );
                let _ = writeln!(
                    out,
                    "  out-degree avg/max: {:.4} / {}",
                    m.avg_out_degree, m.max_out_degree
                );
            }
            None => {
                let _ = writeln!(out, "  empty");
            }
        }
    }
    let _ = writeln!(
        out,
        "Distinct nodes across graphs: {} (required: {})",
        thousands(data.distinct_nodes as u64),
        thousands(data.min_nodes as u64)
    );

    section(&mut out, "FILES GENERATED");
    if data.files.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for f in &data.files {
        let _ = writeln!(out, "- {f}");
    }
    out
}

/// Sorted names of graph exports, charts and dashboards in `dir`.
pub fn generated_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let keep = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json" | "svg" | "html")
        );
        if keep {
            if let Some(name) = path.file_name() {
                files.push(name.to_string_lossy().into_owned());
            }
        }
    }
    files.sort();
    Ok(files)
}

pub fn write_report(data: &ReportData, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(REPORT_FILE);
    std::fs::write(&path, render_report(data))
        .with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "report.written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn data() -> ReportData {
        ReportData {
            generated_at: Local.with_ymd_and_hms(2025, 9, 8, 14, 30, 0).unwrap(),
            stats: CollectionStats {
                total_posts: 12_345,
                unique_users: 800,
                unique_hashtags: 1_500,
                unique_mentions: 300,
            },
            engagement: EngagementSummary {
                avg_reposts: 1.234,
                avg_likes: 10.0,
                total_likes: 123_450,
                ..EngagementSummary::default()
            },
            metrics: vec![(GraphKind::Mention, None)],
            distinct_nodes: 2_100,
            min_nodes: 1000,
            files: vec!["hashtag_graph.json".into()],
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn report_has_every_section() {
        let text = render_report(&data());
        assert!(text.contains("Generated on: 2025-09-08 14:30:00"));
        assert!(text.contains("Total Posts Collected: 12,345"));
        assert!(text.contains("Average Reposts per Post: 1.23"));
        assert!(text.contains("Total Likes: 123,450"));
        assert!(text.contains("User Mention Graph:\n  empty"));
        assert!(text.contains("Distinct nodes across graphs: 2,100 (required: 1,000)"));
        assert!(text.contains("- hashtag_graph.json"));
    }

    #[test]
    fn lists_only_generated_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.svg", "a_graph.json", "notes.txt", "network_dashboard.html"] {
            std::fs::write(tmp.path().join(name), "x").unwrap();
        }
        let files = generated_files(tmp.path()).unwrap();
        assert_eq!(files, vec!["a_graph.json", "b.svg", "network_dashboard.html"]);
    }

    #[test]
    fn writes_into_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(&data(), &tmp.path().join("out")).unwrap();
        assert!(path.ends_with(REPORT_FILE));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("SOCIAL NETWORK"));
    }
}

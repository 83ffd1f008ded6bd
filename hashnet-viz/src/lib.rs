//! Charts and the HTML dashboard for an analysis run.
//!
//! [`render_all`] draws every chart whose input is non-empty into one
//! directory and writes `network_dashboard.html` linking them.
use std::path::{Path, PathBuf};

use hashnet_common::Post;
use hashnet_graph::{Centrality, GraphKind, GraphMetrics, GraphSet, NodeScore};
use hashnet_store::{CollectionStats, EngagementSummary, TokenCount, UserActivity};
use plotters::drawing::DrawingAreaErrorKind;
use tracing::{info, warn};

pub mod charts;
pub mod dashboard;
pub mod network;

pub use dashboard::{render_html, write_dashboard, DashboardData};
pub use network::{network_chart, NetworkLayout, PlacedNode, NETWORK_NODES};

pub const DASHBOARD_FILE: &str = "network_dashboard.html";

#[derive(thiserror::Error, Debug)]
pub enum VizError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for VizError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        VizError::Draw(err.to_string())
    }
}

/// Inputs gathered by the visualize phase.
pub struct VizInput<'a> {
    pub posts: &'a [Post],
    pub graphs: &'a GraphSet,
    pub stats: CollectionStats,
    pub engagement: EngagementSummary,
    /// Every hashtag with its usage count, most used first.
    pub hashtag_counts: &'a [TokenCount],
    pub daily_hashtags: &'a [TokenCount],
    pub users: &'a [UserActivity],
    pub metrics: Vec<(GraphKind, Option<GraphMetrics>)>,
    pub rankings: Vec<(GraphKind, Centrality, Vec<NodeScore>)>,
}

/// Draw all charts plus the dashboard under `dir`; returns written paths.
pub fn render_all(input: VizInput<'_>, dir: &Path) -> Result<Vec<PathBuf>, VizError> {
    std::fs::create_dir_all(dir)?;
    let mut written: Vec<PathBuf> = Vec::new();

    for graph in input.graphs.iter() {
        if graph.is_empty() {
            warn!(graph = %graph.kind(), "viz.skip.empty_graph");
            continue;
        }
        let slug = graph.kind().slug();
        let path = dir.join(format!("{slug}_degree_distribution.svg"));
        charts::degree_distribution(graph, &path)?;
        written.push(path);

        let path = dir.join(format!("{slug}_network.svg"));
        network_chart(graph, &path)?;
        written.push(path);
    }

    if input.hashtag_counts.is_empty() {
        warn!("viz.skip.hashtag_analysis");
    } else {
        let path = dir.join("hashtag_analysis.svg");
        charts::hashtag_analysis(
            input.hashtag_counts,
            &input.graphs.hashtag,
            input.daily_hashtags,
            &path,
        )?;
        written.push(path);
    }

    if input.posts.is_empty() {
        warn!("viz.skip.engagement");
    } else {
        let path = dir.join("engagement_analysis.svg");
        charts::engagement_distributions(input.posts, &path)?;
        written.push(path);
    }

    if input.users.is_empty() {
        warn!("viz.skip.user_activity");
    } else {
        let path = dir.join("user_activity.svg");
        charts::user_activity(input.users, &path)?;
        written.push(path);

        let path = dir.join("user_analysis.svg");
        charts::user_analysis(input.users, &path)?;
        written.push(path);
    }

    let data = DashboardData {
        stats: input.stats,
        engagement: input.engagement,
        metrics: input.metrics,
        rankings: input.rankings,
        charts: written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
    };
    let dashboard = dir.join(DASHBOARD_FILE);
    write_dashboard(&data, &dashboard)?;
    written.push(dashboard);

    info!(dir = %dir.display(), files = written.len(), "viz.render.done");
    Ok(written)
}

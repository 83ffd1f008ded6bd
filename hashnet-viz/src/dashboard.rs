use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use hashnet_graph::{Centrality, GraphKind, GraphMetrics, NodeScore};
use hashnet_store::{CollectionStats, EngagementSummary};
use tracing::info;

use crate::VizError;

/// Everything the HTML dashboard shows.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub stats: CollectionStats,
    pub engagement: EngagementSummary,
    pub metrics: Vec<(GraphKind, Option<GraphMetrics>)>,
    pub rankings: Vec<(GraphKind, Centrality, Vec<NodeScore>)>,
    /// Chart file names relative to the dashboard.
    pub charts: Vec<String>,
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin-bottom:1.5em}\
td,th{border:1px solid #ccc;padding:4px 10px;text-align:right}\
th{background:#f0f0f0}td:first-child,th:first-child{text-align:left}\
.cards{display:flex;gap:1em;margin-bottom:1.5em}\
.card{border:1px solid #ccc;border-radius:6px;padding:1em 1.5em}\
.card b{display:block;font-size:1.8em}\
img{max-width:100%;border:1px solid #eee;margin-bottom:1em}";

pub fn render_html(data: &DashboardData) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <title>Social Network Analysis Dashboard</title><style>{STYLE}</style></head><body>\n\
         <h1>Social Network Analysis Dashboard</h1>\n"
    );

    let s = &data.stats;
    let _ = writeln!(html, "<h2>Network Overview</h2><div class=\"cards\">");
    for (label, value) in [
        ("Total Posts", s.total_posts),
        ("Unique Users", s.unique_users),
        ("Unique Hashtags", s.unique_hashtags),
        ("Unique Mentions", s.unique_mentions),
    ] {
        let _ = writeln!(html, "<div class=\"card\"><b>{value}</b>{label}</div>");
    }
    let _ = writeln!(html, "</div>");

    let e = &data.engagement;
    let _ = writeln!(
        html,
        "<h2>Engagement Metrics</h2><table><tr><th>Metric</th><th>Average</th></tr>\
         <tr><td>Reposts</td><td>{:.2}</td></tr><tr><td>Likes</td><td>{:.2}</td></tr>\
         <tr><td>Replies</td><td>{:.2}</td></tr><tr><td>Quotes</td><td>{:.2}</td></tr></table>",
        e.avg_reposts, e.avg_likes, e.avg_replies, e.avg_quotes
    );

    let _ = writeln!(
        html,
        "<h2>Graph Metrics</h2><table><tr><th>Graph</th><th>Nodes</th><th>Edges</th>\
         <th>Density</th><th>Weakly connected</th><th>Avg clustering</th>\
         <th>Avg in-degree</th><th>Max in-degree</th><th>Max out-degree</th></tr>"
    );
    for (kind, metrics) in &data.metrics {
        match metrics {
            Some(m) => {
                let _ = writeln!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.6}</td><td>{}</td>\
                     <td>{:.4}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>",
                    kind,
                    m.nodes,
                    m.edges,
                    m.density,
                    if m.weakly_connected { "yes" } else { "no" },
                    m.average_clustering,
                    m.avg_in_degree,
                    m.max_in_degree,
                    m.max_out_degree
                );
            }
            None => {
                let _ = writeln!(html, "<tr><td>{kind}</td><td colspan=\"8\">empty</td></tr>");
            }
        }
    }
    let _ = writeln!(html, "</table>");

    if !data.rankings.is_empty() {
        let _ = writeln!(html, "<h2>Top Nodes</h2>");
        for (kind, measure, scores) in &data.rankings {
            let _ = writeln!(
                html,
                "<h3>{kind} by {measure}</h3><table><tr><th>Node</th><th>Score</th></tr>"
            );
            for s in scores {
                let _ = writeln!(html, "<tr><td>{}</td><td>{:.4}</td></tr>", escape(&s.id), s.score);
            }
            let _ = writeln!(html, "</table>");
        }
    }

    if !data.charts.is_empty() {
        let _ = writeln!(html, "<h2>Charts</h2>");
        for chart in &data.charts {
            let src = escape(chart);
            let _ = writeln!(html, "<div><img src=\"{src}\" alt=\"{src}\"></div>");
        }
    }

    html.push_str("</body></html>\n");
    html
}

pub fn write_dashboard(data: &DashboardData, path: &Path) -> Result<(), VizError> {
    fs::write(path, render_html(data))?;
    info!(path = %path.display(), charts = data.charts.len(), "viz.dashboard.written");
    Ok(())
}

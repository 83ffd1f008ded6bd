//! Node-link drawings of the busiest part of a graph.
//!
//! Only the `max_nodes` highest-degree nodes are drawn, placed on a circle in
//! rank order, with the edges that run between them.
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::path::Path;

use hashnet_graph::SocialGraph;
use plotters::prelude::*;
use tracing::debug;

use crate::charts::Area;
use crate::VizError;

/// Nodes drawn on the standalone network charts.
pub const NETWORK_NODES: usize = 50;
/// Labels are only drawn for graphs at most this large.
const LABEL_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    /// Degree in the full graph, not the drawn subgraph.
    pub degree: usize,
    pub x: f64,
    pub y: f64,
}

/// Positions for a top-degree subgraph; edges index into `nodes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkLayout {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<(usize, usize, u64)>,
}

impl NetworkLayout {
    /// Keep the `max_nodes` nodes with the highest total degree (ties by id)
    /// and place them clockwise from the top of the unit circle.
    pub fn circular(graph: &SocialGraph, max_nodes: usize) -> Self {
        let inner = graph.inner();
        let mut ranked: Vec<(&str, usize)> = inner
            .node_indices()
            .map(|ix| (inner[ix].id.as_str(), graph.degree(ix)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_nodes);

        let n = ranked.len();
        let nodes: Vec<PlacedNode> = ranked
            .iter()
            .enumerate()
            .map(|(i, (id, degree))| {
                let (x, y) = if n == 1 {
                    (0.0, 0.0)
                } else {
                    let angle = TAU * i as f64 / n as f64;
                    (angle.sin(), angle.cos())
                };
                PlacedNode {
                    id: (*id).to_string(),
                    degree: *degree,
                    x,
                    y,
                }
            })
            .collect();

        let slot: HashMap<&str, usize> = ranked
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (*id, i))
            .collect();
        let mut edges: Vec<(usize, usize, u64)> = graph
            .edges()
            .filter_map(|(s, t, w)| Some((*slot.get(s)?, *slot.get(t)?, w)))
            .collect();
        edges.sort_unstable();

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Draw `layout` into one panel. Node radius grows with degree.
pub(crate) fn draw_network(
    area: &Area<'_>,
    title: &str,
    layout: &NetworkLayout,
    color: RGBColor,
) -> Result<(), VizError> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(20)
        .build_cartesian_2d(-1.25f64..1.25f64, -1.25f64..1.25f64)?;

    let at = |i: usize| (layout.nodes[i].x, layout.nodes[i].y);
    let max_weight = layout.edges.iter().map(|e| e.2).max().unwrap_or(1).max(1) as f64;
    chart.draw_series(layout.edges.iter().map(|&(s, t, w)| {
        let alpha = 0.25 + 0.5 * (w as f64 / max_weight);
        PathElement::new(vec![at(s), at(t)], BLACK.mix(alpha))
    }))?;

    let max_degree = layout.nodes.iter().map(|n| n.degree).max().unwrap_or(1).max(1) as f64;
    chart.draw_series(layout.nodes.iter().map(|n| {
        let radius = 3 + (9.0 * n.degree as f64 / max_degree).round() as i32;
        Circle::new((n.x, n.y), radius, color.mix(0.85).filled())
    }))?;

    if layout.nodes.len() <= LABEL_LIMIT {
        chart.draw_series(
            layout
                .nodes
                .iter()
                .map(|n| Text::new(n.id.clone(), (n.x, n.y + 0.08), ("sans-serif", 12))),
        )?;
    }
    Ok(())
}

/// Standalone network chart of the top [`NETWORK_NODES`] nodes.
pub fn network_chart(graph: &SocialGraph, path: &Path) -> Result<(), VizError> {
    let layout = NetworkLayout::circular(graph, NETWORK_NODES);

    let root = SVGBackend::new(path, (900, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let title = format!("{} (Top {} nodes)", graph.kind(), layout.nodes.len());
    draw_network(&root, &title, &layout, RGBColor(173, 216, 230))?;

    root.present()?;
    debug!(
        path = %path.display(),
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "viz.chart.network"
    );
    Ok(())
}

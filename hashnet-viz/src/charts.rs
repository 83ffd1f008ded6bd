//! SVG charts drawn with `plotters`.
//!
//! Each function renders one file. Callers skip charts whose input is empty;
//! the functions themselves still draw a valid (empty) chart in that case.
use std::path::Path;

use hashnet_common::Post;
use hashnet_graph::SocialGraph;
use hashnet_store::{TokenCount, UserActivity};
use plotters::coord::ranged1d::SegmentValue;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::network::{draw_network, NetworkLayout};
use crate::VizError;

const BINS: usize = 30;
pub const TOP_HASHTAGS: usize = 20;
const TOP_USERS: usize = 15;
const COOCCURRENCE_PANEL_NODES: usize = 10;
const SKY: RGBColor = RGBColor(135, 206, 235);
const SALMON: RGBColor = RGBColor(250, 128, 114);
const GOLD: RGBColor = RGBColor(255, 215, 0);
const PLUM: RGBColor = RGBColor(221, 160, 221);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

pub(crate) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Counts of values grouped into equal-width bins starting at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub width: u64,
    pub counts: Vec<u32>,
}

/// Group `values` into at most `max_bins` bins of equal integer width.
pub fn bucket(values: &[u64], max_bins: usize) -> Buckets {
    let max = values.iter().copied().max().unwrap_or(0);
    let bins = max_bins.max(1) as u64;
    let width = (max / bins + 1).max(1);
    let len = (max / width + 1) as usize;

    let mut counts = vec![0u32; len];
    for v in values {
        let slot = &mut counts[(v / width) as usize];
        *slot = slot.saturating_add(1);
    }
    Buckets { width, counts }
}

fn draw_buckets(
    area: &Area<'_>,
    title: &str,
    x_desc: &str,
    buckets: &Buckets,
    color: RGBColor,
) -> Result<(), VizError> {
    let n = buckets.counts.len().max(1) as u32;
    let y_max = buckets.counts.iter().copied().max().unwrap_or(0).max(1);
    let width = buckets.width;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((0u32..n).into_segmented(), 0u32..(y_max + y_max / 10 + 1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Frequency")
        .x_label_formatter(&|v| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => (u64::from(*i) * width).to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(color.mix(0.7).filled())
            .margin(1)
            .data(
                buckets
                    .counts
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i as u32, *c)),
            ),
    )?;
    Ok(())
}

/// In-degree and out-degree histograms side by side.
pub fn degree_distribution(graph: &SocialGraph, path: &Path) -> Result<(), VizError> {
    let inner = graph.inner();
    let ins: Vec<u64> = inner.node_indices().map(|ix| graph.in_degree(ix) as u64).collect();
    let outs: Vec<u64> = inner.node_indices().map(|ix| graph.out_degree(ix) as u64).collect();

    let root = SVGBackend::new(path, (1000, 450)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&format!("{} - Degree Distribution", graph.kind()), ("sans-serif", 22))?;
    let panels = root.split_evenly((1, 2));

    draw_buckets(&panels[0], "In-degree", "In-degree", &bucket(&ins, 20), SKY)?;
    draw_buckets(&panels[1], "Out-degree", "Out-degree", &bucket(&outs, 20), ORANGE)?;

    root.present()?;
    debug!(path = %path.display(), nodes = ins.len(), "viz.chart.degree");
    Ok(())
}

/// Vertical bars in the given order, one label per bar.
fn draw_ranked_bars(
    area: &Area<'_>,
    title: &str,
    y_desc: &str,
    labels: &[&str],
    counts: &[u32],
    color: RGBColor,
) -> Result<(), VizError> {
    let n = labels.len().max(1) as u32;
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..n).into_segmented(), 0u32..(y_max + y_max / 10 + 1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .y_desc(y_desc)
        .x_label_formatter(&|v| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(color.filled())
            .margin(4)
            .data(counts.iter().enumerate().map(|(i, c)| (i as u32, *c))),
    )?;
    Ok(())
}

fn draw_scatter(
    area: &Area<'_>,
    title: &str,
    (x_desc, y_desc): (&str, &str),
    points: &[(f64, f64)],
    color: RGBColor,
) -> Result<(), VizError> {
    let x_max = points.iter().map(|p| p.0).fold(1.0, f64::max) * 1.1;
    let y_max = points.iter().map(|p| p.1).fold(1.0, f64::max) * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;
    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, 4, color.mix(0.6).filled())),
    )?;
    Ok(())
}

fn draw_timeline(area: &Area<'_>, days: &[TokenCount]) -> Result<(), VizError> {
    let n = days.len().max(1) as i32;
    let y_max = days.iter().map(|d| d.count).max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(area)
        .caption("Hashtag Usage Over Time", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(50)
        .build_cartesian_2d(-1i32..n, 0u64..(y_max + y_max / 10 + 1))?;

    chart
        .configure_mesh()
        .x_labels(days.len().clamp(1, 10))
        .x_desc("Date")
        .y_desc("Posts with hashtags")
        .x_label_formatter(&|i| {
            usize::try_from(*i)
                .ok()
                .and_then(|i| days.get(i))
                .map(|d| d.token.clone())
                .unwrap_or_default()
        })
        .draw()?;

    let points: Vec<(i32, u64)> = days
        .iter()
        .enumerate()
        .map(|(i, d)| (i as i32, d.count))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))?;
    Ok(())
}

/// Counts per power-of-two bin: slot `k` holds values in `[2^k, 2^(k+1))`.
/// Zeros are ignored; the result always has at least one slot.
pub fn log2_bucket(values: &[u64]) -> Vec<u32> {
    let slot = |v: u64| (u64::BITS - 1 - v.leading_zeros()) as usize;
    let len = values
        .iter()
        .filter(|v| **v > 0)
        .map(|v| slot(*v) + 1)
        .max()
        .unwrap_or(1);
    let mut counts = vec![0u32; len];
    for v in values.iter().filter(|v| **v > 0) {
        let c = &mut counts[slot(*v)];
        *c = c.saturating_add(1);
    }
    counts
}

/// Bars labelled by the lower bound of each power-of-two bin.
fn draw_log2_histogram(
    area: &Area<'_>,
    title: &str,
    y_desc: &str,
    values: &[u64],
) -> Result<(), VizError> {
    let counts = log2_bucket(values);
    let labels: Vec<String> = (0..counts.len()).map(|k| (1u64 << k).to_string()).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    draw_ranked_bars(area, title, y_desc, &labels, &counts, LIGHT_GREEN)
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Four panels: the most used hashtags, how usage counts are distributed,
/// the densest corner of the co-occurrence network and usage per day.
///
/// `tags` holds every hashtag, most used first.
pub fn hashtag_analysis(
    tags: &[TokenCount],
    cooccurrence: &SocialGraph,
    days: &[TokenCount],
    path: &Path,
) -> Result<(), VizError> {
    let top = &tags[..tags.len().min(TOP_HASHTAGS)];
    let labels: Vec<&str> = top.iter().map(|t| t.token.as_str()).collect();
    let counts: Vec<u32> = top.iter().map(|t| clamp_u32(t.count)).collect();
    let frequencies: Vec<u64> = tags.iter().map(|t| t.count).collect();
    let layout = NetworkLayout::circular(cooccurrence, COOCCURRENCE_PANEL_NODES);

    let root = SVGBackend::new(path, (1600, 1200)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Hashtag Analysis", ("sans-serif", 24))?;
    let panels = root.split_evenly((2, 2));

    draw_ranked_bars(
        &panels[0],
        &format!("Top {} Hashtags by Frequency", labels.len()),
        "Posts",
        &labels,
        &counts,
        SKY,
    )?;
    draw_log2_histogram(
        &panels[1],
        "Hashtag Frequency Distribution (log2 bins)",
        "Hashtags",
        &frequencies,
    )?;
    draw_network(
        &panels[2],
        "Top Hashtag Co-occurrence Network",
        &layout,
        SALMON,
    )?;
    draw_timeline(&panels[3], days)?;

    root.present()?;
    debug!(path = %path.display(), tags = tags.len(), days = days.len(), "viz.chart.hashtags");
    Ok(())
}

/// Six histograms: reposts, likes, replies, quotes, hashtags and mentions per post.
pub fn engagement_distributions(posts: &[Post], path: &Path) -> Result<(), VizError> {
    let series = |f: fn(&Post) -> u64| -> Vec<u64> { posts.iter().map(f).collect() };
    let panels: [(&str, &str, Vec<u64>, RGBColor); 6] = [
        ("Repost Distribution", "Reposts", series(|p| p.engagement.reposts), SKY),
        ("Like Distribution", "Likes", series(|p| p.engagement.likes), LIGHT_GREEN),
        ("Reply Distribution", "Replies", series(|p| p.engagement.replies), SALMON),
        ("Quote Distribution", "Quotes", series(|p| p.engagement.quotes), ORANGE),
        ("Hashtag Count Distribution", "Hashtags per post", series(|p| p.hashtags.len() as u64), GOLD),
        ("Mention Count Distribution", "Mentions per post", series(|p| p.mentions.len() as u64), PLUM),
    ];

    let root = SVGBackend::new(path, (1500, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Engagement Analysis", ("sans-serif", 24))?;
    let areas = root.split_evenly((2, 3));

    for (area, (title, x_desc, values, color)) in areas.iter().zip(panels.iter()) {
        draw_buckets(area, title, x_desc, &bucket(values, BINS), *color)?;
    }

    root.present()?;
    debug!(path = %path.display(), posts = posts.len(), "viz.chart.engagement");
    Ok(())
}

/// Posts per author against their mean engagement.
pub fn user_activity(users: &[UserActivity], path: &Path) -> Result<(), VizError> {
    let points: Vec<(f64, f64)> = users
        .iter()
        .map(|u| (u.posts as f64, u.avg_engagement))
        .collect();

    let root = SVGBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_scatter(
        &root,
        "User Activity: Posts vs Engagement",
        ("Posts", "Average reposts + likes"),
        &points,
        GREEN,
    )?;
    root.present()?;
    Ok(())
}

/// Four panels: the most active authors, reposts against likes, hashtags
/// against mentions and how many posts authors write.
///
/// `users` is ordered most active first.
pub fn user_analysis(users: &[UserActivity], path: &Path) -> Result<(), VizError> {
    let top = &users[..users.len().min(TOP_USERS)];
    let labels: Vec<&str> = top.iter().map(|u| u.author_id.as_str()).collect();
    let counts: Vec<u32> = top.iter().map(|u| clamp_u32(u.posts)).collect();
    let engagement: Vec<(f64, f64)> = users.iter().map(|u| (u.avg_reposts, u.avg_likes)).collect();
    let behaviour: Vec<(f64, f64)> = users
        .iter()
        .map(|u| (u.hashtags as f64, u.mentions as f64))
        .collect();
    let posts: Vec<u64> = users.iter().map(|u| u.posts).collect();

    let root = SVGBackend::new(path, (1600, 1200)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("User Activity Analysis", ("sans-serif", 24))?;
    let panels = root.split_evenly((2, 2));

    draw_ranked_bars(
        &panels[0],
        &format!("Top {} Users by Post Count", labels.len()),
        "Posts",
        &labels,
        &counts,
        SKY,
    )?;
    draw_scatter(
        &panels[1],
        "User Engagement: Reposts vs Likes",
        ("Average reposts", "Average likes"),
        &engagement,
        LIGHT_GREEN,
    )?;
    draw_scatter(
        &panels[2],
        "User Behavior: Hashtags vs Mentions",
        ("Hashtags used", "Mentions made"),
        &behaviour,
        SALMON,
    )?;
    draw_buckets(
        &panels[3],
        "Distribution of User Post Counts",
        "Posts per user",
        &bucket(&posts, 20),
        GOLD,
    )?;

    root.present()?;
    debug!(path = %path.display(), users = users.len(), "viz.chart.users");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_get_unit_bins() {
        let b = bucket(&[0, 1, 1, 3], 30);
        assert_eq!(b.width, 1);
        assert_eq!(b.counts, vec![1, 2, 0, 1]);
    }

    #[test]
    fn large_values_are_capped_at_max_bins() {
        let values: Vec<u64> = (0..=1000).collect();
        let b = bucket(&values, 30);
        assert!(b.counts.len() <= 30);
        assert_eq!(b.counts.iter().map(|c| *c as usize).sum::<usize>(), values.len());
    }

    #[test]
    fn log2_bins_group_by_power_of_two() {
        // 1 | 2,3 | 4..7 | 8..15
        assert_eq!(log2_bucket(&[1, 2, 3, 4, 7, 9, 0]), vec![1, 2, 2, 1]);
        assert_eq!(log2_bucket(&[]), vec![0]);
        assert_eq!(log2_bucket(&[0, 0]), vec![0]);
    }

    #[test]
    fn empty_input_has_one_empty_bin() {
        let b = bucket(&[], 20);
        assert_eq!(b, Buckets { width: 1, counts: vec![0] });
    }
}

//! Phase orchestration.
//!
//! Every requested phase runs even when an earlier one failed: a failed
//! collection still lets analysis run over what is already stored. A graph
//! sample below `analysis.min_nodes` is the exception and aborts the run
//! before visualization. The run as a whole fails if any phase failed, and
//! the report is only written when all of them succeeded.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use hashnet_common::HashnetError;
use hashnet_config::{CooccurrenceDirection, HashnetConfig};
use hashnet_graph::{
    BuildOptions, Centrality, GraphKind, GraphMetrics, GraphSet, NodeScore, build_all, export_all,
    top_nodes,
};
use hashnet_social::twitter::TwitterApi;
use hashnet_social::{Collector, CollectorSettings, EngagementFilter, PostSource};
use hashnet_store::PostStore;
use hashnet_viz::{VizInput, render_all};
use tracing::{error, info, warn};

use crate::cli::PhasePlan;
use crate::report::{ReportData, generated_files, write_report};

const USER_ACTIVITY_CHART: i64 = 50;
const CHECK_QUERY_LIMIT: usize = 10;

/// Rankings computed per graph.
fn measures_for(kind: GraphKind) -> &'static [Centrality] {
    match kind {
        GraphKind::HashtagCooccurrence | GraphKind::Mention => &Centrality::ALL,
        GraphKind::UserHashtag => &[Centrality::Degree],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub kept: usize,
    pub inserted: u64,
    pub failed_queries: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub distinct_nodes: usize,
    pub metrics: Vec<(GraphKind, Option<GraphMetrics>)>,
    pub rankings: Vec<(GraphKind, Centrality, Vec<NodeScore>)>,
}

pub struct Pipeline {
    cfg: HashnetConfig,
    output_dir: PathBuf,
    store: PostStore,
}

impl Pipeline {
    pub async fn open(cfg: HashnetConfig, output_dir: Option<PathBuf>) -> Result<Self> {
        let store = PostStore::connect(&cfg.storage.database_url)
            .await
            .with_context(|| format!("open database {}", cfg.storage.database_url))?;
        let output_dir = output_dir.unwrap_or_else(|| cfg.analysis.output_dir.clone());
        Ok(Self {
            cfg,
            output_dir,
            store,
        })
    }

    pub fn with_store(cfg: HashnetConfig, store: PostStore, output_dir: PathBuf) -> Self {
        Self {
            cfg,
            output_dir,
            store,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            symmetric_cooccurrence: self.cfg.analysis.cooccurrence == CooccurrenceDirection::Symmetric,
        }
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        let c = &self.cfg.collection;
        CollectorSettings {
            hashtags: c.hashtags.clone(),
            lang: c.lang.clone(),
            max_results_per_query: c.max_results_per_query,
            filter: EngagementFilter {
                min_reposts: c.min_reposts,
                min_likes: c.min_likes,
            },
            pause: Duration::from_millis(c.pause_ms),
        }
    }

    pub fn twitter(&self) -> Result<TwitterApi> {
        TwitterApi::with_base_url(&self.cfg.twitter.base_url, self.cfg.twitter.bearer_token.clone())
    }

    /// Search every configured hashtag and store what was found.
    pub async fn collect<S: PostSource>(&self, source: S) -> Result<CollectSummary> {
        if self.cfg.collection.hashtags.is_empty() {
            bail!("no hashtags configured under collection.hashtags");
        }
        let outcome = Collector::new(source, self.collector_settings()).collect().await;
        let failed_queries = outcome.failed_queries();

        if outcome.posts.is_empty() {
            bail!(
                "no posts were collected ({failed_queries} of {} queries failed)",
                outcome.queries.len()
            );
        }

        let inserted = self
            .store
            .insert_posts(&outcome.posts)
            .await
            .context("store collected posts")?;

        let summary = CollectSummary {
            kept: outcome.posts.len(),
            inserted,
            failed_queries,
        };
        info!(
            kept = summary.kept,
            inserted = summary.inserted,
            failed_queries = summary.failed_queries,
            "phase.collect.done"
        );
        Ok(summary)
    }

    fn rankings(&self, set: &GraphSet) -> Vec<(GraphKind, Centrality, Vec<NodeScore>)> {
        let top_n = self.cfg.analysis.top_n;
        let mut out = Vec::new();
        for kind in GraphKind::ALL {
            let graph = set.get(kind);
            for &measure in measures_for(kind) {
                match top_nodes(graph, measure, top_n) {
                    Ok(scores) => out.push((kind, measure, scores)),
                    Err(err) => {
                        warn!(graph = %kind, %measure, error = %err, "phase.analyze.ranking_skipped");
                    }
                }
            }
        }
        out
    }

    fn metrics(set: &GraphSet) -> Vec<(GraphKind, Option<GraphMetrics>)> {
        set.iter().map(|g| (g.kind(), GraphMetrics::compute(g))).collect()
    }

    /// Build the graphs from every stored post, enforce the node floor,
    /// compute metrics and rankings and export graph JSON.
    pub async fn analyze(&self) -> Result<AnalysisOutcome> {
        let posts = self.store.all_posts().await.context("load posts")?;
        let set = build_all(&posts, self.build_options());
        let distinct_nodes = set
            .ensure_min_nodes(self.cfg.analysis.min_nodes)
            .context("graph sample too small")?;

        let metrics = Self::metrics(&set);
        let rankings = self.rankings(&set);
        for (kind, measure, scores) in &rankings {
            let top: Vec<&str> = scores.iter().take(3).map(|s| s.id.as_str()).collect();
            info!(graph = %kind, %measure, ?top, "phase.analyze.top");
        }

        let exports = export_all(&set, &self.output_dir).context("export graphs")?;
        info!(
            posts = posts.len(),
            distinct_nodes,
            exports = exports.len(),
            "phase.analyze.done"
        );
        Ok(AnalysisOutcome {
            distinct_nodes,
            metrics,
            rankings,
        })
    }

    /// Render charts and the dashboard, reusing analysis results when given.
    pub async fn visualize(&self, analysis: Option<&AnalysisOutcome>) -> Result<Vec<PathBuf>> {
        let posts = self.store.all_posts().await.context("load posts")?;
        let stats = self.store.collection_stats().await?;
        let engagement = self.store.engagement_summary().await?;
        let hashtag_counts = self.store.top_hashtags(-1).await?;
        let daily = self.store.daily_hashtag_posts().await?;
        let users = self.store.user_activity(USER_ACTIVITY_CHART).await?;

        let set = build_all(&posts, self.build_options());
        let (metrics, rankings) = match analysis {
            Some(a) => (a.metrics.clone(), a.rankings.clone()),
            None => (Self::metrics(&set), self.rankings(&set)),
        };

        let written = render_all(
            VizInput {
                posts: &posts,
                graphs: &set,
                stats,
                engagement,
                hashtag_counts: &hashtag_counts,
                daily_hashtags: &daily,
                users: &users,
                metrics,
                rankings,
            },
            &self.output_dir,
        )
        .context("render charts")?;

        info!(files = written.len(), "phase.visualize.done");
        Ok(written)
    }

    /// Database round trip plus one small search against the API.
    pub async fn check<S: PostSource>(&self, source: &S) -> Result<()> {
        self.store.ping().await.context("database check")?;
        info!(url = %self.cfg.storage.database_url, "phase.check.database_ok");

        let probe = self
            .cfg
            .collection
            .hashtags
            .first()
            .map(|h| self.collector_settings().query_for(h))
            .unwrap_or_else(|| "#rustlang".to_string());
        let posts = source
            .search(&probe, CHECK_QUERY_LIMIT)
            .await
            .with_context(|| format!("{} search check", source.name()))?;
        info!(source = source.name(), query = %probe, results = posts.len(), "phase.check.api_ok");
        Ok(())
    }

    pub async fn report(&self, analysis: Option<&AnalysisOutcome>) -> Result<PathBuf> {
        let (metrics, distinct_nodes) = match analysis {
            Some(a) => (a.metrics.clone(), a.distinct_nodes),
            None => {
                let posts = self.store.all_posts().await.context("load posts")?;
                let set = build_all(&posts, self.build_options());
                (Self::metrics(&set), set.distinct_nodes())
            }
        };
        let files = if self.output_dir.exists() {
            generated_files(&self.output_dir)?
        } else {
            Vec::new()
        };

        let data = ReportData {
            generated_at: Local::now(),
            stats: self.store.collection_stats().await?,
            engagement: self.store.engagement_summary().await?,
            metrics,
            distinct_nodes,
            min_nodes: self.cfg.analysis.min_nodes,
            files,
        };
        write_report(&data, &self.output_dir)
    }
}

fn record<T>(phase: &'static str, result: Result<T>, failures: &mut Vec<&'static str>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(err) => {
            error!(phase, error = %format!("{err:#}"), "phase.failed");
            failures.push(phase);
            None
        }
    }
}

fn is_insufficient_data(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<HashnetError>(),
        Some(HashnetError::InsufficientData { .. })
    )
}

/// Run the planned phases with the live Twitter source.
pub async fn run(cfg: HashnetConfig, plan: PhasePlan, output_dir: Option<PathBuf>) -> Result<()> {
    if plan.needs_credentials() {
        let missing = cfg.missing_credentials();
        if !missing.is_empty() {
            bail!("missing credentials: {}", missing.join(", "));
        }
    }
    cfg.validate()?;

    let pipeline = Pipeline::open(cfg, output_dir).await?;
    let source = if plan.check || plan.collect {
        Some(pipeline.twitter()?)
    } else {
        None
    };
    run_plan(&pipeline, plan, source).await
}

pub async fn run_plan<S: PostSource>(
    pipeline: &Pipeline,
    plan: PhasePlan,
    source: Option<S>,
) -> Result<()> {
    let mut failures: Vec<&'static str> = Vec::new();
    let mut source = source;

    if plan.check {
        match source.as_ref() {
            Some(s) => {
                record("check", pipeline.check(s).await, &mut failures);
            }
            None => failures.push("check"),
        }
    }

    if plan.collect {
        match source.take() {
            Some(s) => {
                record("collect", pipeline.collect(s).await, &mut failures);
            }
            None => failures.push("collect"),
        }
    }

    let analysis = if plan.analyze {
        match pipeline.analyze().await {
            Err(err) if is_insufficient_data(&err) => {
                error!(error = %format!("{err:#}"), "run.aborted");
                return Err(err.context("analyze aborted the run"));
            }
            result => record("analyze", result, &mut failures),
        }
    } else {
        None
    };

    if plan.visualize {
        record(
            "visualize",
            pipeline.visualize(analysis.as_ref()).await,
            &mut failures,
        );
    }

    if !failures.is_empty() {
        bail!("phases failed: {}", failures.join(", "));
    }

    if plan.writes_report() {
        let path = pipeline.report(analysis.as_ref()).await?;
        info!(path = %path.display(), "run.report");
    }
    info!(output_dir = %pipeline.output_dir().display(), "run.done");
    Ok(())
}

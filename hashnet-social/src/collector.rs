//! Hashtag-driven collection over a [`PostSource`].
//!
//! One query per configured hashtag. A failing query is logged and recorded in
//! the outcome, and collection moves on to the next hashtag. Posts matched by
//! more than one hashtag are kept once (first query wins).
use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use hashnet_common::Post;

use crate::twitter::extract::EngagementFilter;

/// Anything that can turn a search query into normalized posts.
#[async_trait]
pub trait PostSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Post>>;
}

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub hashtags: Vec<String>,
    /// Appended as `lang:<code>`; empty disables the clause.
    pub lang: String,
    pub max_results_per_query: usize,
    pub filter: EngagementFilter,
    pub pause: Duration,
}

impl CollectorSettings {
    pub fn query_for(&self, hashtag: &str) -> String {
        let tag = hashtag.trim();
        if self.lang.trim().is_empty() {
            tag.to_string()
        } else {
            format!("{tag} lang:{}", self.lang.trim())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub hashtag: String,
    pub fetched: usize,
    pub kept: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct CollectionOutcome {
    pub posts: Vec<Post>,
    pub queries: Vec<QueryOutcome>,
}

impl CollectionOutcome {
    pub fn failed_queries(&self) -> usize {
        self.queries.iter().filter(|q| q.error.is_some()).count()
    }
}

pub struct Collector<S> {
    source: S,
    settings: CollectorSettings,
}

impl<S: PostSource> Collector<S> {
    pub fn new(source: S, settings: CollectorSettings) -> Self {
        Self { source, settings }
    }

    pub async fn collect(&self) -> CollectionOutcome {
        let mut outcome = CollectionOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();
        let total = self.settings.hashtags.len();

        for (i, hashtag) in self.settings.hashtags.iter().enumerate() {
            let query = self.settings.query_for(hashtag);
            tracing::info!(source = self.source.name(), %query, "collect.query.start");

            let result = self
                .source
                .search(&query, self.settings.max_results_per_query)
                .await;
            let record = match result {
                Ok(posts) => {
                    let fetched = posts.len();
                    let mut kept = 0usize;
                    for mut post in posts {
                        if !self.settings.filter.accepts(&post) {
                            continue;
                        }
                        if !seen.insert(post.post_id.clone()) {
                            continue;
                        }
                        post.source_query = Some(hashtag.clone());
                        outcome.posts.push(post);
                        kept += 1;
                    }
                    tracing::info!(%hashtag, fetched, kept, "collect.query.done");
                    QueryOutcome {
                        hashtag: hashtag.clone(),
                        fetched,
                        kept,
                        error: None,
                    }
                }
                Err(err) => {
                    tracing::error!(%hashtag, error = %format!("{err:#}"), "collect.query.failed");
                    QueryOutcome {
                        hashtag: hashtag.clone(),
                        fetched: 0,
                        kept: 0,
                        error: Some(format!("{err:#}")),
                    }
                }
            };
            outcome.queries.push(record);

            if i + 1 < total && !self.settings.pause.is_zero() {
                tokio::time::sleep(self.settings.pause).await;
            }
        }

        tracing::info!(
            posts = outcome.posts.len(),
            failed_queries = outcome.failed_queries(),
            "collect.done"
        );
        outcome
    }
}

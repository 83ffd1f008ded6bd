//! Thin wrapper around the Twitter/X v2 recent-search endpoint.
//!
//! Handles auth, request parameter shaping, the 7-day search window and
//! `next_token` pagination before delegating to the shared HTTP client.
use std::borrow::Cow;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hashnet_common::Post;
use hashnet_http::{HttpClient, RequestOpts};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::collector::PostSource;
use crate::twitter::extract::tweet_to_post;
use crate::twitter::types::{SearchResponse, Tweet};

const SEARCH_PATH: &str = "2/tweets/search/recent";
const TWEET_FIELDS: &str = "author_id,created_at,entities,lang,public_metrics";
const PAGE_MIN: usize = 10;
const PAGE_MAX: usize = 100;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn with_base_url(base_url: &str, bearer_token: String) -> Result<Self> {
        let http = HttpClient::new(base_url).context("twitter base url")?;
        Ok(Self {
            http,
            bearer: bearer_token,
        })
    }

    /// Fetch one page of recent results.
    pub async fn search_recent_page(
        &self,
        query: &str,
        max_results: usize,
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let max_results = max_results.clamp(PAGE_MIN, PAGE_MAX);

        // The endpoint only serves the last 7 days and rejects an end_time
        // closer than 10s to now.
        let now = OffsetDateTime::now_utc();
        let start = now - Duration::days(7) + Duration::minutes(1);
        let end = now - Duration::seconds(20);

        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("query", query.into()),
            ("max_results", max_results.to_string().into()),
            ("tweet.fields", TWEET_FIELDS.into()),
            ("start_time", start.format(&Rfc3339)?.into()),
            ("end_time", end.format(&Rfc3339)?.into()),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token.into()));
        }

        let resp: SearchResponse = self
            .http
            .get_json(
                SEARCH_PATH,
                RequestOpts {
                    bearer: Some(&self.bearer),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("twitter recent search failed for {query:?}"))?;

        tracing::debug!(
            query,
            results = resp.data.as_ref().map_or(0, Vec::len),
            has_next = resp.next_token().is_some(),
            "twitter.search.page"
        );
        Ok(resp)
    }

    /// Follow `next_token` until `limit` tweets are gathered or pages run out.
    pub async fn search_recent(&self, query: &str, limit: usize) -> Result<Vec<Tweet>> {
        let mut tweets: Vec<Tweet> = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        while tweets.len() < limit {
            let remaining = limit - tweets.len();
            let page = self
                .search_recent_page(query, remaining.min(PAGE_MAX), token.as_deref())
                .await?;
            pages += 1;

            let next = page.next_token().map(str::to_string);
            let data = page.data.unwrap_or_default();
            if data.is_empty() {
                break;
            }
            tweets.extend(data.into_iter().take(remaining));

            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }

        tracing::info!(query, tweets = tweets.len(), pages, "twitter.search.done");
        Ok(tweets)
    }
}

#[async_trait]
impl PostSource for TwitterApi {
    fn name(&self) -> &'static str {
        "twitter"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Post>> {
        let collected_at = Utc::now();
        let tweets = self.search_recent(query, limit).await?;

        let mut posts = Vec::with_capacity(tweets.len());
        for tweet in &tweets {
            match tweet_to_post(tweet, Some(query), collected_at) {
                Ok(post) => posts.push(post),
                Err(err) => {
                    tracing::warn!(tweet_id = %tweet.id, error = %err, "twitter.tweet.skipped");
                }
            }
        }
        Ok(posts)
    }
}

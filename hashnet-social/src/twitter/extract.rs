//! Normalization of raw tweets into [`Post`] records.
//!
//! Hashtags and mentions come from the lowercased text, not from API entities,
//! so posts fetched with a reduced field set still produce the same tokens.
use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hashnet_common::{Engagement, Post};
use regex::Regex;

use crate::twitter::types::Tweet;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention pattern"));

/// `#tag` tokens, lowercased, first occurrence order, no repeats.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    unique_matches(&HASHTAG_RE, &text.to_lowercase())
}

/// Mentioned handles, lowercased and without the leading `@`.
pub fn extract_mentions(text: &str) -> Vec<String> {
    unique_matches(&MENTION_RE, &text.to_lowercase())
        .into_iter()
        .map(|m| m.trim_start_matches('@').to_string())
        .collect()
}

fn unique_matches(re: &Regex, haystack: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    re.find_iter(haystack)
        .map(|m| m.as_str())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Convert a tweet into a normalized post.
///
/// Fails when the tweet has no `author_id` (the field was not requested) or
/// carries an unparsable `created_at`. A missing `created_at` falls back to
/// `collected_at`.
pub fn tweet_to_post(
    tweet: &Tweet,
    source_query: Option<&str>,
    collected_at: DateTime<Utc>,
) -> Result<Post> {
    let author_id = tweet
        .author_id
        .clone()
        .with_context(|| format!("tweet {} has no author_id", tweet.id))?;

    let created_at = match tweet.created_at.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("tweet {} has invalid created_at {raw:?}", tweet.id))?
            .with_timezone(&Utc),
        None => collected_at,
    };

    let engagement = tweet
        .public_metrics
        .as_ref()
        .map(|m| Engagement {
            likes: m.like_count.unwrap_or(0),
            reposts: m.repost_count.unwrap_or(0),
            replies: m.reply_count.unwrap_or(0),
            quotes: m.quote_count.unwrap_or(0),
        })
        .unwrap_or_default();

    let mut builder = Post::builder(tweet.id.clone(), author_id, tweet.text.clone())
        .created_at(created_at)
        .collected_at(collected_at)
        .hashtags(extract_hashtags(&tweet.text))
        .mentions(extract_mentions(&tweet.text))
        .engagement(engagement);
    if let Some(q) = source_query {
        builder = builder.source_query(q);
    }
    Ok(builder.build())
}

/// Engagement threshold: a post passes when it meets *either* bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementFilter {
    pub min_reposts: u64,
    pub min_likes: u64,
}

impl EngagementFilter {
    pub fn accepts(&self, post: &Post) -> bool {
        post.engagement.reposts >= self.min_reposts || post.engagement.likes >= self.min_likes
    }
}

//! Common types and utilities shared across hashnet crates.
//!
//! This crate defines the normalized post record, observability helpers and the
//! shared error type used throughout the hashnet workspace. It stays light so
//! every other crate can depend on it without pulling in network or storage
//! stacks.
//!
//! # Overview
//!
//! - [`Post`]: an immutable, normalized social-media post
//! - [`Engagement`]: like/repost/reply/quote counters attached to a post
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`HashnetError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use hashnet_common::{Engagement, Post};
//!
//! let post = Post::builder("1", "42", "hello #rust @ferris")
//!     .hashtags(["#rust"])
//!     .mentions(["ferris"])
//!     .engagement(Engagement { likes: 3, ..Engagement::default() })
//!     .build();
//! assert_eq!(post.hashtags, vec!["#rust"]);
//! assert_eq!(post.engagement.likes, 3);
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod observability;

/// Engagement counters reported by the source platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub quotes: u64,
}

impl Engagement {
    /// Reposts plus likes; the score used for user activity rankings.
    pub fn score(&self) -> u64 {
        self.reposts.saturating_add(self.likes)
    }
}

/// A normalized social-media post. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Lowercased, `#`-prefixed, de-duplicated in first-seen order.
    pub hashtags: Vec<String>,
    /// Lowercased handles without `@`, de-duplicated in first-seen order.
    pub mentions: Vec<String>,
    pub engagement: Engagement,
    pub collected_at: DateTime<Utc>,
    /// Query that surfaced this post, if it came from a search.
    #[serde(default)]
    pub source_query: Option<String>,
}

impl Post {
    /// Start a builder with the required identity fields.
    pub fn builder(
        post_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> PostBuilder {
        let now = Utc::now();
        PostBuilder {
            post: Post {
                post_id: post_id.into(),
                author_id: author_id.into(),
                text: text.into(),
                created_at: now,
                hashtags: Vec::new(),
                mentions: Vec::new(),
                engagement: Engagement::default(),
                collected_at: now,
                source_query: None,
            },
        }
    }
}

/// Builder for [`Post`], mostly used by the ingestor and by tests.
#[derive(Debug, Clone)]
pub struct PostBuilder {
    post: Post,
}

impl PostBuilder {
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.post.created_at = at;
        self
    }

    pub fn collected_at(mut self, at: DateTime<Utc>) -> Self {
        self.post.collected_at = at;
        self
    }

    pub fn hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post.hashtags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn mentions<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post.mentions = handles.into_iter().map(Into::into).collect();
        self
    }

    pub fn engagement(mut self, engagement: Engagement) -> Self {
        self.post.engagement = engagement;
        self
    }

    pub fn source_query(mut self, query: impl Into<String>) -> Self {
        self.post.source_query = Some(query.into());
        self
    }

    pub fn build(self) -> Post {
        self.post
    }
}

/// Error types used across the hashnet system.
#[derive(thiserror::Error, Debug)]
pub enum HashnetError {
    /// The search API or the database could not be reached or rejected a call.
    #[error("External service error ({service}): {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    /// The input sample does not contain enough distinct entities.
    #[error("Insufficient data: {found} distinct nodes, {required} required")]
    InsufficientData { required: usize, found: usize },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An iterative algorithm did not converge.
    #[error("{algorithm} did not converge after {iterations} iterations")]
    Convergence {
        algorithm: &'static str,
        iterations: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HashnetError {
    pub fn external(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ExternalService {
            service,
            message: err.to_string(),
        }
    }
}

/// Convenient alias for results that use [`HashnetError`].
pub type Result<T> = std::result::Result<T, HashnetError>;

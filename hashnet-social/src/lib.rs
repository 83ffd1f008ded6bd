//! Social network clients and the hashtag collector.
//!
//! Only the Twitter/X recent-search API is implemented. The [`collector`]
//! module is source-agnostic and talks to any [`PostSource`].
pub mod collector;
pub mod twitter;

pub use collector::{CollectionOutcome, Collector, CollectorSettings, PostSource, QueryOutcome};
pub use twitter::extract::EngagementFilter;

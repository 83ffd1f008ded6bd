//! Twitter/X API integration: the search client, JSON response models and the
//! tweet-to-post normalization.
pub mod client;
pub mod extract;
pub mod types;

pub use client::TwitterApi;

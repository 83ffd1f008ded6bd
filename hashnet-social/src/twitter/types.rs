use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<Tweet>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl SearchResponse {
    pub fn next_token(&self) -> Option<&str> {
        self.meta.as_ref()?.next_token.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default)]
    pub result_count: Option<u32>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,

    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    /// RFC 3339.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default, alias = "retweet_count")]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retweet_count_is_accepted_as_repost_count() {
        let m: PublicMetrics =
            serde_json::from_str(r#"{"retweet_count":4,"like_count":9}"#).unwrap();
        assert_eq!(m.repost_count, Some(4));
        assert_eq!(m.like_count, Some(9));
        assert_eq!(m.reply_count, None);
    }

    #[test]
    fn empty_page_has_no_data() {
        let r: SearchResponse = serde_json::from_str(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(r.data.is_none());
        assert!(r.next_token().is_none());
    }
}

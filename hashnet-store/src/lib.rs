//! SQLite-backed document store for normalized posts.
//!
//! Each post is one row; hashtags and mentions are stored as JSON arrays and
//! queried with `json_each`. Writes are idempotent on `post_id`, so running
//! the collector twice over overlapping windows does not duplicate posts.
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use hashnet_common::{Engagement, HashnetError, Post, Result};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS posts (
        post_id       TEXT PRIMARY KEY,
        author_id     TEXT NOT NULL,
        text          TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        hashtags      TEXT NOT NULL DEFAULT '[]',
        mentions      TEXT NOT NULL DEFAULT '[]',
        like_count    INTEGER NOT NULL DEFAULT 0,
        repost_count  INTEGER NOT NULL DEFAULT 0,
        reply_count   INTEGER NOT NULL DEFAULT 0,
        quote_count   INTEGER NOT NULL DEFAULT 0,
        collected_at  TEXT NOT NULL,
        source_query  TEXT
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at)",
];

/// Dataset overview used by the report and dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total_posts: u64,
    pub unique_users: u64,
    pub unique_hashtags: u64,
    pub unique_mentions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub avg_reposts: f64,
    pub avg_likes: f64,
    pub avg_replies: f64,
    pub avg_quotes: f64,
    pub total_reposts: u64,
    pub total_likes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserActivity {
    pub author_id: String,
    pub posts: u64,
    /// Mean of reposts + likes over the author's posts.
    pub avg_engagement: f64,
    pub avg_reposts: f64,
    pub avg_likes: f64,
    /// Hashtags used across all of the author's posts.
    pub hashtags: u64,
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    pub token: String,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

fn db_err(err: sqlx::Error) -> HashnetError {
    HashnetError::external("sqlite", err)
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| HashnetError::external("sqlite", format!("bad timestamp {raw:?}: {e}")))
}

impl PostStore {
    /// Open (creating if needed) the database at `url` and apply the schema.
    ///
    /// In-memory URLs get a single connection so every query sees the same
    /// database.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);
        let in_memory = url.contains(":memory:");
        let mut pool_opts = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 4 });
        if in_memory {
            // dropping the only connection drops the database
            pool_opts = pool_opts.min_connections(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_opts
            .connect_with(opts)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        info!(url, "store.connected");
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        debug!(statements = SCHEMA.len(), "store.migrate");
        Ok(())
    }

    /// Round-trip check for the `check` phase.
    pub async fn ping(&self) -> Result<()> {
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        if one != 1 {
            return Err(HashnetError::external("sqlite", "unexpected ping result"));
        }
        Ok(())
    }

    /// Insert posts in one transaction, skipping ids already stored.
    /// Returns the number of new rows.
    pub async fn insert_posts(&self, posts: &[Post]) -> Result<u64> {
        if posts.is_empty() {
            debug!("store.insert_posts.empty");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut inserted = 0u64;
        for p in posts {
            let res = sqlx::query(
                r#"INSERT INTO posts
                   (post_id, author_id, text, created_at, hashtags, mentions,
                    like_count, repost_count, reply_count, quote_count,
                    collected_at, source_query)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                   ON CONFLICT(post_id) DO NOTHING"#,
            )
            .bind(p.post_id.as_str())
            .bind(p.author_id.as_str())
            .bind(p.text.as_str())
            .bind(fmt_ts(&p.created_at))
            .bind(serde_json::to_string(&p.hashtags)?)
            .bind(serde_json::to_string(&p.mentions)?)
            .bind(to_i64(p.engagement.likes))
            .bind(to_i64(p.engagement.reposts))
            .bind(to_i64(p.engagement.replies))
            .bind(to_i64(p.engagement.quotes))
            .bind(fmt_ts(&p.collected_at))
            .bind(p.source_query.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            inserted += res.rows_affected();
        }
        tx.commit().await.map_err(db_err)?;

        info!(
            offered = posts.len(),
            inserted,
            skipped = posts.len() as u64 - inserted,
            "store.insert_posts"
        );
        Ok(inserted)
    }

    /// Every stored post, oldest first (ties by id).
    pub async fn all_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            r#"SELECT post_id, author_id, text, created_at, hashtags, mentions,
                      like_count, repost_count, reply_count, quote_count,
                      collected_at, source_query
               FROM posts
               ORDER BY created_at ASC, post_id ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
        info!(posts = posts.len(), "store.all_posts");
        Ok(posts)
    }

    pub async fn collection_stats(&self) -> Result<CollectionStats> {
        let row = sqlx::query("SELECT COUNT(*) AS total, COUNT(DISTINCT author_id) AS users FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let unique_hashtags = self.distinct_json_values("hashtags").await?;
        let unique_mentions = self.distinct_json_values("mentions").await?;

        Ok(CollectionStats {
            total_posts: to_u64(row.try_get("total").map_err(db_err)?),
            unique_users: to_u64(row.try_get("users").map_err(db_err)?),
            unique_hashtags,
            unique_mentions,
        })
    }

    async fn distinct_json_values(&self, column: &'static str) -> Result<u64> {
        let sql = format!("SELECT COUNT(DISTINCT j.value) FROM posts, json_each(posts.{column}) AS j");
        let n: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(to_u64(n))
    }

    pub async fn engagement_summary(&self) -> Result<EngagementSummary> {
        let row = sqlx::query(
            r#"SELECT
                 COALESCE(AVG(repost_count), 0.0) AS avg_reposts,
                 COALESCE(AVG(like_count), 0.0)   AS avg_likes,
                 COALESCE(AVG(reply_count), 0.0)  AS avg_replies,
                 COALESCE(AVG(quote_count), 0.0)  AS avg_quotes,
                 COALESCE(SUM(repost_count), 0)   AS total_reposts,
                 COALESCE(SUM(like_count), 0)     AS total_likes
               FROM posts"#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(EngagementSummary {
            avg_reposts: row.try_get("avg_reposts").map_err(db_err)?,
            avg_likes: row.try_get("avg_likes").map_err(db_err)?,
            avg_replies: row.try_get("avg_replies").map_err(db_err)?,
            avg_quotes: row.try_get("avg_quotes").map_err(db_err)?,
            total_reposts: to_u64(row.try_get("total_reposts").map_err(db_err)?),
            total_likes: to_u64(row.try_get("total_likes").map_err(db_err)?),
        })
    }

    /// Most active authors first.
    pub async fn user_activity(&self, limit: i64) -> Result<Vec<UserActivity>> {
        let rows = sqlx::query(
            r#"SELECT author_id,
                      COUNT(*) AS posts,
                      AVG(repost_count + like_count) * 1.0 AS avg_engagement,
                      AVG(repost_count) * 1.0 AS avg_reposts,
                      AVG(like_count) * 1.0 AS avg_likes,
                      SUM(json_array_length(hashtags)) AS hashtag_uses,
                      SUM(json_array_length(mentions)) AS mention_uses
               FROM posts
               GROUP BY author_id
               ORDER BY posts DESC, author_id ASC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|r| {
                Ok(UserActivity {
                    author_id: r.try_get("author_id").map_err(db_err)?,
                    posts: to_u64(r.try_get("posts").map_err(db_err)?),
                    avg_engagement: r.try_get("avg_engagement").map_err(db_err)?,
                    avg_reposts: r.try_get("avg_reposts").map_err(db_err)?,
                    avg_likes: r.try_get("avg_likes").map_err(db_err)?,
                    hashtags: to_u64(r.try_get("hashtag_uses").map_err(db_err)?),
                    mentions: to_u64(r.try_get("mention_uses").map_err(db_err)?),
                })
            })
            .collect()
    }

    /// Hashtag usage counts across posts, most used first. A negative
    /// `limit` returns every hashtag.
    pub async fn top_hashtags(&self, limit: i64) -> Result<Vec<TokenCount>> {
        let rows = sqlx::query(
            r#"SELECT j.value AS token, COUNT(*) AS uses
               FROM posts, json_each(posts.hashtags) AS j
               GROUP BY j.value
               ORDER BY uses DESC, token ASC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|r| {
                Ok(TokenCount {
                    token: r.try_get("token").map_err(db_err)?,
                    count: to_u64(r.try_get("uses").map_err(db_err)?),
                })
            })
            .collect()
    }

    /// Posts carrying at least one hashtag, per UTC day (`YYYY-MM-DD`).
    pub async fn daily_hashtag_posts(&self) -> Result<Vec<TokenCount>> {
        let rows = sqlx::query(
            r#"SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS n
               FROM posts
               WHERE hashtags != '[]'
               GROUP BY day
               ORDER BY day ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|r| {
                Ok(TokenCount {
                    token: r.try_get("day").map_err(db_err)?,
                    count: to_u64(r.try_get("n").map_err(db_err)?),
                })
            })
            .collect()
    }
}

fn row_to_post(r: &SqliteRow) -> Result<Post> {
    let hashtags: String = r.try_get("hashtags").map_err(db_err)?;
    let mentions: String = r.try_get("mentions").map_err(db_err)?;
    let created_at: String = r.try_get("created_at").map_err(db_err)?;
    let collected_at: String = r.try_get("collected_at").map_err(db_err)?;

    Ok(Post {
        post_id: r.try_get("post_id").map_err(db_err)?,
        author_id: r.try_get("author_id").map_err(db_err)?,
        text: r.try_get("text").map_err(db_err)?,
        created_at: parse_ts(&created_at)?,
        hashtags: serde_json::from_str(&hashtags)?,
        mentions: serde_json::from_str(&mentions)?,
        engagement: Engagement {
            likes: to_u64(r.try_get("like_count").map_err(db_err)?),
            reposts: to_u64(r.try_get("repost_count").map_err(db_err)?),
            replies: to_u64(r.try_get("reply_count").map_err(db_err)?),
            quotes: to_u64(r.try_get("quote_count").map_err(db_err)?),
        },
        collected_at: parse_ts(&collected_at)?,
        source_query: r.try_get("source_query").map_err(db_err)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let ts = DateTime::parse_from_rfc3339("2025-09-01T12:00:00.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let s = fmt_ts(&ts);
        assert_eq!(s, "2025-09-01T12:00:00.123Z");
        assert_eq!(parse_ts(&s).unwrap(), ts);
    }

    #[test]
    fn counters_clamp_instead_of_wrapping() {
        assert_eq!(to_i64(u64::MAX), i64::MAX);
        assert_eq!(to_u64(-5), 0);
    }
}

use super::{PostOrder, PostQuery, PostStore, SourceCounts};
use crate::error::StoreError;
use crate::models::{Post, PostId, PostStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

const POST_COLUMNS: &str = r#"
    id, title, status, source_url, published_at,
    views_count::bigint AS views_count, likes_count::bigint AS likes_count,
    ranking_score, ranking_calculated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    status: String,
    source_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    views_count: Option<i64>,
    likes_count: Option<i64>,
    ranking_score: Option<f64>,
    ranking_calculated_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            status: PostStatus::parse(&row.status),
            source_url: row.source_url,
            published_at: row.published_at,
            views_count: row.views_count.unwrap_or(0).max(0) as u64,
            likes_count: row.likes_count.unwrap_or(0).max(0) as u64,
            ranking_score: row.ranking_score,
            ranking_calculated_at: row.ranking_calculated_at,
        }
    }
}

/// Postgres-backed post store over the `posts` table.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(order: PostOrder) -> &'static str {
    match order {
        PostOrder::RankingScoreDesc => {
            "ORDER BY ranking_score DESC NULLS LAST, published_at DESC NULLS LAST, id"
        }
        PostOrder::None => "ORDER BY id",
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE status = 'published'
              AND published_at IS NOT NULL
              AND published_at <= $1
              AND ($2::timestamptz IS NULL OR published_at >= $2)
            {}
            LIMIT $3
            "#,
            order_clause(query.order)
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(query.published_before)
            .bind(query.published_after)
            .bind(query.limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), order = ?query.order, "Fetched posts");
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn write_score(
        &self,
        post_id: PostId,
        score: f64,
        calculated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE posts
            SET ranking_score = $2, ranking_calculated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(score)
        .bind(calculated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stale_scores(
        &self,
        now: DateTime<Utc>,
        stale_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE status = 'published'
              AND published_at IS NOT NULL
              AND published_at <= $1
              AND (
                  $2::timestamptz IS NULL
                  OR ranking_calculated_at IS NULL
                  OR ranking_calculated_at < $2
              )
            ORDER BY id
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(now)
            .bind(stale_before)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn count_by_source(&self, now: DateTime<Utc>) -> Result<SourceCounts, StoreError> {
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(
            r#"
            SELECT NULLIF(TRIM(source_url), '') AS source_url, COUNT(*) AS count
            FROM posts
            WHERE status = 'published'
              AND published_at IS NOT NULL
              AND published_at <= $1
            GROUP BY 1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = SourceCounts::default();
        for (source_url, count) in rows {
            let count = count.max(0) as u64;
            counts.total += count;
            if let Some(url) = source_url {
                counts.by_source_url.push((url, count));
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_clamps_and_parses() {
        let row = PostRow {
            id: 42,
            title: "Octane tips".to_string(),
            status: "PUBLISHED".to_string(),
            source_url: None,
            published_at: None,
            views_count: Some(-3),
            likes_count: None,
            ranking_score: Some(6.5),
            ranking_calculated_at: None,
        };

        let post = Post::from(row);

        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.views_count, 0);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.ranking_score, Some(6.5));
    }

    #[test]
    fn test_score_order_puts_nulls_last() {
        assert!(order_clause(PostOrder::RankingScoreDesc).contains("ranking_score DESC NULLS LAST"));
    }
}

//! # FeedbackRepository
//!
//! 睡眠セッションに紐づくフィードバックの読み取りを担当する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nemuri_domain::{feedback::SleepFeedback, sleep::SleepId};
use sqlx::PgPool;

use crate::error::InfraError;

/// フィードバックリポジトリトレイト
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// セッションの最新フィードバック（`created_at` が最も新しいもの）を取得する
    async fn find_latest_by_sleep_id(
        &self,
        sleep_id: SleepId,
    ) -> Result<Option<SleepFeedback>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    sleep_id:   i64,
    content:    String,
    created_at: DateTime<Utc>,
}

/// PostgreSQL 実装の FeedbackRepository
#[derive(Debug, Clone)]
pub struct PostgresFeedbackRepository {
    pool: PgPool,
}

impl PostgresFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for PostgresFeedbackRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%sleep_id))]
    async fn find_latest_by_sleep_id(
        &self,
        sleep_id: SleepId,
    ) -> Result<Option<SleepFeedback>, InfraError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT sleep_id, content, created_at
            FROM sleep_feedback
            WHERE sleep_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(sleep_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SleepFeedback {
            sleep_id:   SleepId::new(row.sleep_id),
            content:    row.content,
            created_at: row.created_at,
        }))
    }
}

//! # OptimalConditionRepository
//!
//! ユーザーごとの推奨寝室環境の読み取りを担当する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nemuri_domain::{optimal_condition::OptimalCondition, user::UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 推奨環境リポジトリトレイト
#[async_trait]
pub trait OptimalConditionRepository: Send + Sync {
    /// `updated_at` の新しい順に最大 `limit` 件取得する
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<OptimalCondition>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct OptimalConditionRow {
    user_id:            Uuid,
    updated_at:         DateTime<Utc>,
    target_temperature: f64,
    target_humidity:    f64,
    description:        Option<String>,
}

/// PostgreSQL 実装の OptimalConditionRepository
#[derive(Debug, Clone)]
pub struct PostgresOptimalConditionRepository {
    pool: PgPool,
}

impl PostgresOptimalConditionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OptimalConditionRepository for PostgresOptimalConditionRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id, limit = limit))]
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<OptimalCondition>, InfraError> {
        let rows = sqlx::query_as::<_, OptimalConditionRow>(
            r#"
            SELECT user_id, updated_at, target_temperature, target_humidity, description
            FROM optimal_condition
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2
            "#,
        )
        .bind(*user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OptimalCondition {
                user_id:            UserId::from_uuid(row.user_id),
                updated_at:         row.updated_at,
                target_temperature: row.target_temperature,
                target_humidity:    row.target_humidity,
                description:        row.description,
            })
            .collect())
    }
}

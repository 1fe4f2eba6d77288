//! # SleepRepository
//!
//! 睡眠セッションとステージ集計・ステージ推移の読み取りを担当する。
//! すべての検索はユーザー ID もしくはそのユーザーのセッション ID で絞り込む。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nemuri_domain::{
    sleep::{
        CalendarMonth,
        SleepId,
        SleepLevel,
        SleepLevelDetail,
        SleepLevelSummary,
        SleepSession,
    },
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 睡眠セッションリポジトリトレイト
#[async_trait]
pub trait SleepRepository: Send + Sync {
    /// 指定年月のセッションを日付の昇順で取得する
    async fn find_by_month(
        &self,
        user_id: &UserId,
        month: CalendarMonth,
    ) -> Result<Vec<SleepSession>, InfraError>;

    /// 指定日のセッションを取得する
    async fn find_by_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<SleepSession>, InfraError>;

    /// 新しい日付から最大 `limit` 件のセッションを取得する
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<SleepSession>, InfraError>;

    /// セッションのステージ別集計を取得する
    async fn find_level_summary(
        &self,
        sleep_id: SleepId,
    ) -> Result<Vec<SleepLevelSummary>, InfraError>;

    /// セッションのステージ推移を開始時刻の昇順で取得する
    async fn find_level_detail(&self, sleep_id: SleepId)
    -> Result<Vec<SleepLevelDetail>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct SleepSessionRow {
    sleep_id:            i64,
    user_id:             Uuid,
    sleep_date:          NaiveDate,
    total_sleep_minutes: i32,
    sleep_score:         i32,
}

impl From<SleepSessionRow> for SleepSession {
    fn from(row: SleepSessionRow) -> Self {
        Self {
            id:                  SleepId::new(row.sleep_id),
            user_id:             UserId::from_uuid(row.user_id),
            sleep_date:          row.sleep_date,
            total_sleep_minutes: row.total_sleep_minutes,
            sleep_score:         row.sleep_score,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LevelSummaryRow {
    level:   String,
    count:   i32,
    minutes: i32,
}

#[derive(sqlx::FromRow)]
struct LevelDetailRow {
    start_time:   DateTime<Utc>,
    level:        String,
    duration_sec: i32,
}

/// 保存値を睡眠ステージに変換する
///
/// 未知の値はデータ不整合として扱う。
fn parse_level(value: &str) -> Result<SleepLevel, InfraError> {
    value
        .parse::<SleepLevel>()
        .map_err(|_| InfraError::unexpected(format!("不正な睡眠ステージ: {value}")))
}

const SESSION_COLUMNS: &str = "sleep_id, user_id, sleep_date, total_sleep_minutes, sleep_score";

/// PostgreSQL 実装の SleepRepository
#[derive(Debug, Clone)]
pub struct PostgresSleepRepository {
    pool: PgPool,
}

impl PostgresSleepRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SleepRepository for PostgresSleepRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id, year = month.year(), month = month.month()))]
    async fn find_by_month(
        &self,
        user_id: &UserId,
        month: CalendarMonth,
    ) -> Result<Vec<SleepSession>, InfraError> {
        // 範囲条件にしてインデックス (user_id, sleep_date) を使えるようにする
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sleep_data
            WHERE user_id = $1 AND sleep_date >= $2 AND sleep_date < $3
            ORDER BY sleep_date
            "#
        );
        let rows = sqlx::query_as::<_, SleepSessionRow>(&sql)
            .bind(*user_id.as_uuid())
            .bind(month.first_day())
            .bind(month.next_month_first_day())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SleepSession::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %date))]
    async fn find_by_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<SleepSession>, InfraError> {
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sleep_data
            WHERE user_id = $1 AND sleep_date = $2
            "#
        );
        let row = sqlx::query_as::<_, SleepSessionRow>(&sql)
            .bind(*user_id.as_uuid())
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SleepSession::from))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%user_id, limit = limit))]
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<SleepSession>, InfraError> {
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sleep_data
            WHERE user_id = $1
            ORDER BY sleep_date DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, SleepSessionRow>(&sql)
            .bind(*user_id.as_uuid())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SleepSession::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%sleep_id))]
    async fn find_level_summary(
        &self,
        sleep_id: SleepId,
    ) -> Result<Vec<SleepLevelSummary>, InfraError> {
        let rows = sqlx::query_as::<_, LevelSummaryRow>(
            r#"
            SELECT level, count, minutes
            FROM sleep_level_summary
            WHERE sleep_id = $1
            ORDER BY level
            "#,
        )
        .bind(sleep_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SleepLevelSummary {
                    level:   parse_level(&row.level)?,
                    count:   row.count,
                    minutes: row.minutes,
                })
            })
            .collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%sleep_id))]
    async fn find_level_detail(
        &self,
        sleep_id: SleepId,
    ) -> Result<Vec<SleepLevelDetail>, InfraError> {
        let rows = sqlx::query_as::<_, LevelDetailRow>(
            r#"
            SELECT start_time, level, duration_sec
            FROM sleep_level_detail
            WHERE sleep_id = $1
            ORDER BY start_time
            "#,
        )
        .bind(sleep_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SleepLevelDetail {
                    start_time:   row.start_time,
                    level:        parse_level(&row.level)?,
                    duration_sec: row.duration_sec,
                })
            })
            .collect()
    }
}

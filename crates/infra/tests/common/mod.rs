//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成・シード投入ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use nemuri_domain::{
    sleep::SleepId,
    user::{Email, NewUser, PasswordHash, User, UserId, UserName},
};
use nemuri_infra::repository::{PostgresUserRepository, UserRepository};
use sqlx::PgPool;

/// テスト用の固定時刻
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// テスト用の新規ユーザーを作成する
pub fn new_user(email: &str) -> NewUser {
    NewUser {
        id:       UserId::new(),
        name:     UserName::new("眠井 太郎").unwrap(),
        email:    Email::new(email).unwrap(),
        password: PasswordHash::new("5e884898da28047151d0e56f8dc62927").unwrap(),
    }
}

/// ユーザーを登録して返す
pub async fn insert_user(pool: &PgPool, email: &str) -> User {
    PostgresUserRepository::new(pool.clone())
        .insert(&new_user(email))
        .await
        .unwrap()
}

/// 睡眠セッションを直接投入し、採番された ID を返す
pub async fn insert_session(
    pool: &PgPool,
    user_id: &UserId,
    sleep_date: NaiveDate,
    total_sleep_minutes: i32,
    sleep_score: i32,
) -> SleepId {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sleep_data (user_id, sleep_date, total_sleep_minutes, sleep_score)
        VALUES ($1, $2, $3, $4)
        RETURNING sleep_id
        "#,
    )
    .bind(*user_id.as_uuid())
    .bind(sleep_date)
    .bind(total_sleep_minutes)
    .bind(sleep_score)
    .fetch_one(pool)
    .await
    .unwrap();
    SleepId::new(id)
}

pub async fn insert_summary(pool: &PgPool, sleep_id: SleepId, level: &str, count: i32, minutes: i32) {
    sqlx::query(
        r#"
        INSERT INTO sleep_level_summary (sleep_id, level, count, minutes)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(sleep_id.as_i64())
    .bind(level)
    .bind(count)
    .bind(minutes)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_detail(
    pool: &PgPool,
    sleep_id: SleepId,
    start_time: DateTime<Utc>,
    level: &str,
    duration_sec: i32,
) {
    sqlx::query(
        r#"
        INSERT INTO sleep_level_detail (sleep_id, start_time, level, duration_sec)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(sleep_id.as_i64())
    .bind(start_time)
    .bind(level)
    .bind(duration_sec)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_feedback(pool: &PgPool, sleep_id: SleepId, content: &str, created_at: DateTime<Utc>) {
    sqlx::query(
        r#"
        INSERT INTO sleep_feedback (sleep_id, content, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(sleep_id.as_i64())
    .bind(content)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_condition(
    pool: &PgPool,
    user_id: &UserId,
    updated_at: DateTime<Utc>,
    target_temperature: f64,
    target_humidity: f64,
    description: Option<&str>,
) {
    sqlx::query(
        r#"
        INSERT INTO optimal_condition
            (user_id, updated_at, target_temperature, target_humidity, description)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(*user_id.as_uuid())
    .bind(updated_at)
    .bind(target_temperature)
    .bind(target_humidity)
    .bind(description)
    .execute(pool)
    .await
    .unwrap();
}

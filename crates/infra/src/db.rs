//! # PostgreSQL データベース接続管理
//!
//! 接続プールの作成、マイグレーション、疎通確認を行う。
//!
//! ## 接続の扱い
//!
//! リポジトリは `&PgPool` に対してクエリを発行する。接続はクエリごとにプールから借り、
//! 完了時（エラー時を含む）にドロップで返却される。リクエストが接続を保持し続けることはない。
//! 取得待ちは [`ACQUIRE_TIMEOUT`] で打ち切り、リトライはしない。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use nemuri_infra::db;
//!
//! async fn example(options: sqlx::postgres::PgConnectOptions) -> Result<(), sqlx::Error> {
//!     let pool = db::create_pool(options).await?;
//!     db::ping(&pool).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

/// プールの最大接続数
const MAX_CONNECTIONS: u32 = 10;

/// 接続取得のタイムアウト
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// 同梱のマイグレーションを適用する
///
/// 適用済みのものはスキップされる。sqlx が advisory lock を取るため、
/// 複数プロセスから同時に呼んでも安全。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL 接続プールを作成する
///
/// 起動時に一度だけ呼び、プールをアプリケーション全体で共有する。
/// 最初の接続を確立できなければエラーを返す。
pub async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
}

/// 接続を確立せずにプールを作成する
///
/// 最初のクエリ実行時に接続する。データベースより先にサービスを起動したい場合に使う。
pub fn create_lazy_pool(options: PgConnectOptions, acquire_timeout: Duration) -> PgPool {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(acquire_timeout)
        .connect_lazy_with(options)
}

/// `SELECT 1` で疎通を確認する（Readiness Check 用）
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

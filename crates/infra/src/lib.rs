//! # Nemuri インフラ層
//!
//! PostgreSQL とトークン署名を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL 接続プールとマイグレーション
//! - **リポジトリ実装**: ユーザー、睡眠セッション、フィードバック、推奨環境の読み書き
//! - **トークンコーデック**: HS256 によるアクセストークンの発行と検証
//!
//! ## 依存関係
//!
//! ```text
//! sleep-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、マイグレーション、疎通確認
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリトレイトと PostgreSQL 実装
//! - [`token`] - トークンコーデック
//! - `mock` - インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use nemuri_infra::{db, repository::PostgresUserRepository};
//!
//! async fn setup(options: sqlx::postgres::PgConnectOptions) -> Result<(), sqlx::Error> {
//!     let pool = db::create_pool(options).await?;
//!     let users = PostgresUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;
pub mod token;

pub use error::{InfraError, InfraErrorKind};
pub use token::{JwtTokenCodec, TokenCodec};

//! # リポジトリ実装
//!
//! ## 設計方針
//!
//! - **トレイト経由**: ユースケース層は `Arc<dyn XxxRepository>` で受け取り、テストではモックに差し替える
//! - **パラメータ化クエリ**: 値はすべてバインドパラメータで渡す
//! - **ユーザースコープ**: 睡眠データの検索は必ず `user_id` で絞り込む

pub mod feedback_repository;
pub mod optimal_condition_repository;
pub mod sleep_repository;
pub mod user_repository;

pub use feedback_repository::{FeedbackRepository, PostgresFeedbackRepository};
pub use optimal_condition_repository::{
    OptimalConditionRepository,
    PostgresOptimalConditionRepository,
};
pub use sleep_repository::{PostgresSleepRepository, SleepRepository};
pub use user_repository::{PostgresUserRepository, StoredToken, UserRepository};

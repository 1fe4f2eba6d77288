//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックは usecase 層に委譲
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `auth`: サインアップ、ログイン
//! - `sleep`: 睡眠データの参照（トークン必須）

pub mod auth;
pub mod health;
pub mod sleep;

pub use auth::{AuthState, login, signup};
pub use health::{ReadinessState, health_check, readiness_check};
pub use sleep::{SleepState, calendar, daily_details, feedback, optimizer, recent};

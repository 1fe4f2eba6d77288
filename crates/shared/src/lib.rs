//! # Nemuri 共有ユーティリティ
//!
//! 睡眠記録サービスの各クレートから利用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / sleep-service のいずれからも依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum には依存しない（HTTP レスポンス変換は各サービスの責務）
//!
//! ## フィーチャー
//!
//! - `observability`: トレーシング初期化、リクエストスパン、Canonical Log Line

#[cfg(feature = "observability")]
pub mod canonical_log;
pub mod error_response;
pub mod health;
pub mod observability;

pub use error_response::{ErrorResponse, ProblemType};
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};

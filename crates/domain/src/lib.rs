//! # Nemuri ドメイン層
//!
//! 睡眠記録サービスのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: ユーザー、睡眠セッション
//! - **値オブジェクト**: メールアドレス、アクセストークン、睡眠ステージ
//! - **ドメインエラー**: 入力値の検証失敗やエンティティ不在を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! sleep-service → infra → domain
//! ```
//!
//! ドメイン層はデータベースや HTTP に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`user`] - ユーザーとメールアドレス
//! - [`token`] - アクセストークンとクレーム
//! - [`sleep`] - 睡眠セッション、ステージ集計、ステージ推移
//! - [`feedback`] - 睡眠フィードバック
//! - [`optimal_condition`] - 推奨寝室環境
//! - [`clock`] - 時刻プロバイダ
//!
//! ## 使用例
//!
//! ```rust
//! use nemuri_domain::{DomainError, user::Email};
//!
//! let email = Email::new("sleeper@example.com").unwrap();
//! assert_eq!(email.as_str(), "sleeper@example.com");
//!
//! let error = DomainError::NotFound {
//!     entity_type: "SleepSession",
//!     id:          "2024-05-01".to_string(),
//! };
//! assert!(error.to_string().contains("SleepSession"));
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod feedback;
pub mod optimal_condition;
pub mod sleep;
pub mod token;
pub mod user;

pub use error::DomainError;

//! # ドメイン層エラー定義
//!
//! 入力値の検証失敗やエンティティ不在を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | ユーザー / 睡眠セッション / フィードバックが存在しない |
//! | `Conflict` | 409 Conflict | メールアドレスの重複登録 |
//!
//! ## 使用例
//!
//! ```rust
//! use nemuri_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!     if name.is_empty() {
//!         return Err(DomainError::Validation("名前は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_name("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// サービス層でこのエラーを受け取り、HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - メールアドレスの形式不正
    /// - 存在しない日付（2月30日など）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"User", "SleepSession", "SleepFeedback"）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 一意制約に反する登録
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}

//! # ユースケース層
//!
//! Sleep Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **トレイトベースの設計**: ハンドラはトレイトオブジェクト越しに呼ぶ（テストではスタブに差し替える）
//! - **依存性注入**: リポジトリ、トークンコーデック、Clock を外部から注入
//! - **薄いハンドラ**: ハンドラは入出力の変換だけを行い、判断はユースケースに集約

pub mod auth;
pub mod session;
pub mod sleep;

use async_trait::async_trait;
pub use auth::{AuthUseCaseImpl, IssuedToken, LoginInput, SignupInput};
use nemuri_domain::{
    feedback::SleepFeedback,
    optimal_condition::OptimalCondition,
    sleep::{DailySleepDetails, SleepSession},
    token::AccessToken,
};
pub use session::SessionValidator;
pub use sleep::SleepUseCaseImpl;

use crate::error::ServiceError;

/// 認証ユースケーストレイト
#[async_trait]
pub trait AuthUseCase: Send + Sync {
    /// ユーザーを登録し、最初のトークンを発行する
    async fn signup(&self, input: SignupInput) -> Result<IssuedToken, ServiceError>;

    /// 資格情報を照合し、新しいトークンを発行する
    async fn login(&self, input: LoginInput) -> Result<IssuedToken, ServiceError>;
}

/// 睡眠データ参照ユースケーストレイト
///
/// どのメソッドも `email` と提示トークンで失効チェックを行ってから参照する。
#[async_trait]
pub trait SleepUseCase: Send + Sync {
    /// 指定年月のセッション一覧（日付の昇順）
    async fn calendar(
        &self,
        email: &str,
        token: &AccessToken,
        year: i64,
        month: i64,
    ) -> Result<Vec<SleepSession>, ServiceError>;

    /// 指定日のセッションとステージ集計・推移
    async fn daily_details(
        &self,
        email: &str,
        token: &AccessToken,
        year: i64,
        month: i64,
        day: i64,
    ) -> Result<DailySleepDetails, ServiceError>;

    /// 直近のセッション（新しい順、最大 3 件）
    async fn recent(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<Vec<SleepSession>, ServiceError>;

    /// 最新セッションの最新フィードバック
    async fn latest_feedback(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<SleepFeedback, ServiceError>;

    /// 推奨寝室環境（新しい順、最大 3 件）
    async fn optimal_conditions(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<Vec<OptimalCondition>, ServiceError>;
}

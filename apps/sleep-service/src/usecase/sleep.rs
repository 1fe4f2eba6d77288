//! # 睡眠データ参照ユースケース
//!
//! トークンで保護された読み取り系の処理を実装する。
//!
//! どの処理も次の順で進む:
//!
//! 1. 入力値の検証（メールアドレス形式、年月日）。ここまではデータベースに触れない
//! 2. [`SessionValidator`] による失効チェック
//! 3. 解決したユーザー ID で絞り込んだクエリを順に実行する
//!
//! 一覧系（カレンダー、直近セッション、推奨環境）は 0 件でもエラーにしない。
//! 単一の行が必要な処理（日別詳細、フィードバック）は行が無ければ `NotFound`。

use std::sync::Arc;

use async_trait::async_trait;
use nemuri_domain::{
    DomainError,
    feedback::SleepFeedback,
    optimal_condition::{OptimalCondition, RECENT_CONDITION_LIMIT},
    sleep::{
        CalendarMonth,
        DailySleepDetails,
        RECENT_SESSION_LIMIT,
        SleepSession,
        calendar_date,
    },
    token::AccessToken,
    user::Email,
};
use nemuri_infra::repository::{FeedbackRepository, OptimalConditionRepository, SleepRepository};

use super::{SessionValidator, SleepUseCase};
use crate::error::ServiceError;

/// 睡眠データ参照ユースケースの実装
pub struct SleepUseCaseImpl {
    session_validator:            SessionValidator,
    sleep_repository:             Arc<dyn SleepRepository>,
    feedback_repository:          Arc<dyn FeedbackRepository>,
    optimal_condition_repository: Arc<dyn OptimalConditionRepository>,
}

impl SleepUseCaseImpl {
    pub fn new(
        session_validator: SessionValidator,
        sleep_repository: Arc<dyn SleepRepository>,
        feedback_repository: Arc<dyn FeedbackRepository>,
        optimal_condition_repository: Arc<dyn OptimalConditionRepository>,
    ) -> Self {
        Self {
            session_validator,
            sleep_repository,
            feedback_repository,
            optimal_condition_repository,
        }
    }
}

#[async_trait]
impl SleepUseCase for SleepUseCaseImpl {
    #[tracing::instrument(skip_all, fields(year = year, month = month))]
    async fn calendar(
        &self,
        email: &str,
        token: &AccessToken,
        year: i64,
        month: i64,
    ) -> Result<Vec<SleepSession>, ServiceError> {
        let email = Email::new(email)?;
        let month = CalendarMonth::new(year, month)?;

        let user_id = self.session_validator.validate(&email, token).await?;
        let sessions = self.sleep_repository.find_by_month(&user_id, month).await?;
        Ok(sessions)
    }

    #[tracing::instrument(skip_all, fields(year = year, month = month, day = day))]
    async fn daily_details(
        &self,
        email: &str,
        token: &AccessToken,
        year: i64,
        month: i64,
        day: i64,
    ) -> Result<DailySleepDetails, ServiceError> {
        let email = Email::new(email)?;
        let date = calendar_date(year, month, day)?;

        let user_id = self.session_validator.validate(&email, token).await?;
        let session = self
            .sleep_repository
            .find_by_date(&user_id, date)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SleepSession",
                id:          date.to_string(),
            })?;

        let summary = self.sleep_repository.find_level_summary(session.id).await?;
        let detail = self.sleep_repository.find_level_detail(session.id).await?;

        Ok(DailySleepDetails {
            session,
            summary,
            detail,
        })
    }

    #[tracing::instrument(skip_all)]
    async fn recent(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<Vec<SleepSession>, ServiceError> {
        let email = Email::new(email)?;

        let user_id = self.session_validator.validate(&email, token).await?;
        let sessions = self
            .sleep_repository
            .find_recent(&user_id, RECENT_SESSION_LIMIT)
            .await?;
        Ok(sessions)
    }

    #[tracing::instrument(skip_all)]
    async fn latest_feedback(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<SleepFeedback, ServiceError> {
        let email = Email::new(email)?;

        let user_id = self.session_validator.validate(&email, token).await?;
        let latest = self
            .sleep_repository
            .find_recent(&user_id, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SleepSession",
                id:          user_id.to_string(),
            })?;

        let feedback = self
            .feedback_repository
            .find_latest_by_sleep_id(latest.id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SleepFeedback",
                id:          latest.id.to_string(),
            })?;
        Ok(feedback)
    }

    #[tracing::instrument(skip_all)]
    async fn optimal_conditions(
        &self,
        email: &str,
        token: &AccessToken,
    ) -> Result<Vec<OptimalCondition>, ServiceError> {
        let email = Email::new(email)?;

        let user_id = self.session_validator.validate(&email, token).await?;
        let conditions = self
            .optimal_condition_repository
            .find_recent(&user_id, RECENT_CONDITION_LIMIT)
            .await?;
        Ok(conditions)
    }
}

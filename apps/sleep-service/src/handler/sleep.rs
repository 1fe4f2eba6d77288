//! # 睡眠データハンドラ
//!
//! トークンで保護された参照系エンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /sleep/calendar` - 指定年月のセッション一覧
//! - `POST /sleep/daily-details` - 指定日のステージ集計・推移
//! - `POST /sleep/recent` - 直近 3 件のセッション
//! - `POST /sleep/feedback` - 最新セッションの最新フィードバック
//! - `POST /sleep/optimizer` - 直近 3 件の推奨寝室環境
//!
//! 引数の順序に意味がある。[`BearerToken`] はボディを読む前に評価されるため、
//! `Authorization` ヘッダーが無いリクエストはボディの解析もデータベースアクセスもせずに 401 になる。

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, NaiveDate, Utc};
use nemuri_domain::{
    feedback::SleepFeedback,
    optimal_condition::OptimalCondition,
    sleep::{DailySleepDetails, SleepId, SleepLevel, SleepSession},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    extract::{BearerToken, JsonBody, lenient_i64},
    usecase::SleepUseCase,
};

/// 睡眠データハンドラの共有状態
pub struct SleepState {
    pub usecase: Arc<dyn SleepUseCase>,
}

// --- リクエスト型 ---

/// メールアドレスのみを受け取るリクエスト
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// カレンダーリクエスト
#[derive(Debug, Deserialize)]
pub struct CalendarRequest {
    pub email: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub year:  i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub month: i64,
}

/// 日別詳細リクエスト
#[derive(Debug, Deserialize)]
pub struct DailyDetailsRequest {
    pub email: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub year:  i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub month: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub day:   i64,
}

// --- レスポンス型 ---

/// カレンダーの 1 日分
#[derive(Debug, Serialize)]
pub struct CalendarEntryDto {
    pub sleep_date:          NaiveDate,
    pub total_sleep_minutes: i32,
    pub sleep_score:         i32,
}

impl From<SleepSession> for CalendarEntryDto {
    fn from(session: SleepSession) -> Self {
        Self {
            sleep_date:          session.sleep_date,
            total_sleep_minutes: session.total_sleep_minutes,
            sleep_score:         session.sleep_score,
        }
    }
}

/// 直近セッション
#[derive(Debug, Serialize)]
pub struct RecentSessionDto {
    pub sleep_id:            SleepId,
    pub sleep_date:          NaiveDate,
    pub total_sleep_minutes: i32,
    pub sleep_score:         i32,
}

impl From<SleepSession> for RecentSessionDto {
    fn from(session: SleepSession) -> Self {
        Self {
            sleep_id:            session.id,
            sleep_date:          session.sleep_date,
            total_sleep_minutes: session.total_sleep_minutes,
            sleep_score:         session.sleep_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LevelSummaryDto {
    pub level:   SleepLevel,
    pub count:   i32,
    pub minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct LevelDetailDto {
    pub start_time:   DateTime<Utc>,
    pub level:        SleepLevel,
    pub duration_sec: i32,
}

/// 日別詳細
#[derive(Debug, Serialize)]
pub struct DailyDetailsResponse {
    pub sleep_id: SleepId,
    pub summary:  Vec<LevelSummaryDto>,
    pub detail:   Vec<LevelDetailDto>,
}

impl From<DailySleepDetails> for DailyDetailsResponse {
    fn from(details: DailySleepDetails) -> Self {
        Self {
            sleep_id: details.session.id,
            summary:  details
                .summary
                .into_iter()
                .map(|s| LevelSummaryDto {
                    level:   s.level,
                    count:   s.count,
                    minutes: s.minutes,
                })
                .collect(),
            detail:   details
                .detail
                .into_iter()
                .map(|d| LevelDetailDto {
                    start_time:   d.start_time,
                    level:        d.level,
                    duration_sec: d.duration_sec,
                })
                .collect(),
        }
    }
}

/// フィードバック
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub sleep_id:   SleepId,
    pub content:    String,
    pub created_at: DateTime<Utc>,
}

impl From<SleepFeedback> for FeedbackResponse {
    fn from(feedback: SleepFeedback) -> Self {
        Self {
            sleep_id:   feedback.sleep_id,
            content:    feedback.content,
            created_at: feedback.created_at,
        }
    }
}

/// 推奨寝室環境
#[derive(Debug, Serialize)]
pub struct OptimalConditionDto {
    pub updated_at:         DateTime<Utc>,
    pub target_temperature: f64,
    pub target_humidity:    f64,
    pub description:        Option<String>,
}

impl From<OptimalCondition> for OptimalConditionDto {
    fn from(condition: OptimalCondition) -> Self {
        Self {
            updated_at:         condition.updated_at,
            target_temperature: condition.target_temperature,
            target_humidity:    condition.target_humidity,
            description:        condition.description,
        }
    }
}

// --- ハンドラ ---

/// POST /sleep/calendar
pub async fn calendar(
    State(state): State<Arc<SleepState>>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<CalendarRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sessions = state
        .usecase
        .calendar(&req.email, &token, req.year, req.month)
        .await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(CalendarEntryDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /sleep/daily-details
///
/// セッションが無い日は 404。ステージの行が無いだけなら空配列で返す。
pub async fn daily_details(
    State(state): State<Arc<SleepState>>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<DailyDetailsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state
        .usecase
        .daily_details(&req.email, &token, req.year, req.month, req.day)
        .await?;

    Ok(Json(DailyDetailsResponse::from(details)))
}

/// POST /sleep/recent
pub async fn recent(
    State(state): State<Arc<SleepState>>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sessions = state.usecase.recent(&req.email, &token).await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(RecentSessionDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /sleep/feedback
pub async fn feedback(
    State(state): State<Arc<SleepState>>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let feedback = state.usecase.latest_feedback(&req.email, &token).await?;

    Ok(Json(FeedbackResponse::from(feedback)))
}

/// POST /sleep/optimizer
pub async fn optimizer(
    State(state): State<Arc<SleepState>>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let conditions = state
        .usecase
        .optimal_conditions(&req.email, &token)
        .await?;

    Ok(Json(
        conditions
            .into_iter()
            .map(OptimalConditionDto::from)
            .collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        routing::post,
    };
    use chrono::TimeZone;
    use nemuri_domain::{
        sleep::{SleepLevelDetail, SleepLevelSummary},
        token::AccessToken,
        user::UserId,
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    /// 受け取った引数を記録するスタブ
    #[derive(Default)]
    struct StubSleepUseCase {
        received: Mutex<Vec<String>>,
    }

    impl StubSleepUseCase {
        fn record(&self, email: &str, token: &AccessToken) {
            self.received
                .lock()
                .unwrap()
                .push(format!("{email}:{}", token.as_str()));
        }
    }

    fn session(id: i64, day: u32) -> SleepSession {
        SleepSession {
            id:                  SleepId::new(id),
            user_id:             UserId::new(),
            sleep_date:          NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            total_sleep_minutes: 420,
            sleep_score:         80,
        }
    }

    #[async_trait]
    impl SleepUseCase for StubSleepUseCase {
        async fn calendar(
            &self,
            email: &str,
            token: &AccessToken,
            year: i64,
            month: i64,
        ) -> Result<Vec<SleepSession>, ServiceError> {
            self.record(email, token);
            if (year, month) == (2024, 5) {
                Ok(vec![session(1, 3)])
            } else {
                Ok(vec![])
            }
        }

        async fn daily_details(
            &self,
            email: &str,
            token: &AccessToken,
            _year: i64,
            _month: i64,
            _day: i64,
        ) -> Result<DailySleepDetails, ServiceError> {
            self.record(email, token);
            Ok(DailySleepDetails {
                session: session(7, 3),
                summary: vec![SleepLevelSummary {
                    level:   SleepLevel::Rem,
                    count:   4,
                    minutes: 90,
                }],
                detail:  vec![SleepLevelDetail {
                    start_time:   Utc.with_ymd_and_hms(2024, 5, 2, 23, 0, 0).unwrap(),
                    level:        SleepLevel::Light,
                    duration_sec: 1800,
                }],
            })
        }

        async fn recent(
            &self,
            email: &str,
            token: &AccessToken,
        ) -> Result<Vec<SleepSession>, ServiceError> {
            self.record(email, token);
            Ok(vec![session(2, 4), session(1, 3)])
        }

        async fn latest_feedback(
            &self,
            email: &str,
            token: &AccessToken,
        ) -> Result<SleepFeedback, ServiceError> {
            self.record(email, token);
            Err(ServiceError::NotFound("フィードバックがありません".to_string()))
        }

        async fn optimal_conditions(
            &self,
            email: &str,
            token: &AccessToken,
        ) -> Result<Vec<OptimalCondition>, ServiceError> {
            self.record(email, token);
            Ok(vec![OptimalCondition {
                user_id:            UserId::new(),
                updated_at:         Utc.with_ymd_and_hms(2024, 5, 3, 6, 0, 0).unwrap(),
                target_temperature: 19.5,
                target_humidity:    55.0,
                description:        None,
            }])
        }
    }

    fn create_test_app(usecase: Arc<StubSleepUseCase>) -> Router {
        let state = Arc::new(SleepState { usecase });
        Router::new()
            .route("/sleep/calendar", post(calendar))
            .route("/sleep/daily-details", post(daily_details))
            .route("/sleep/recent", post(recent))
            .route("/sleep/feedback", post(feedback))
            .route("/sleep/optimizer", post(optimizer))
            .with_state(state)
    }

    fn authorized(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer presented-token")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_calendar_日付はyyyy_mm_dd形式() {
        // Given
        let usecase = Arc::new(StubSleepUseCase::default());
        let sut = create_test_app(usecase.clone());
        let request = authorized(
            "/sleep/calendar",
            r#"{"email":"sleeper@example.com","year":"2024","month":5}"#,
        );

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!([
                {"sleep_date": "2024-05-03", "total_sleep_minutes": 420, "sleep_score": 80}
            ])
        );
        assert_eq!(
            *usecase.received.lock().unwrap(),
            vec!["sleeper@example.com:presented-token".to_string()]
        );
    }

    #[tokio::test]
    async fn test_calendar_該当なしは空配列で200() {
        let sut = create_test_app(Arc::new(StubSleepUseCase::default()));
        let request = authorized(
            "/sleep/calendar",
            r#"{"email":"sleeper@example.com","year":2023,"month":1}"#,
        );

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_daily_details_レスポンス形状() {
        let sut = create_test_app(Arc::new(StubSleepUseCase::default()));
        let request = authorized(
            "/sleep/daily-details",
            r#"{"email":"sleeper@example.com","year":2024,"month":5,"day":3}"#,
        );

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "sleep_id": 7,
                "summary": [{"level": "rem", "count": 4, "minutes": 90}],
                "detail": [
                    {"start_time": "2024-05-02T23:00:00Z", "level": "light", "duration_sec": 1800}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_recent_sleep_idを含む() {
        let sut = create_test_app(Arc::new(StubSleepUseCase::default()));
        let request = authorized("/sleep/recent", r#"{"email":"sleeper@example.com"}"#);

        let response = sut.oneshot(request).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json[0]["sleep_id"], 2);
        assert_eq!(json[0]["sleep_date"], "2024-05-04");
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_feedback_見つからなければ404() {
        let sut = create_test_app(Arc::new(StubSleepUseCase::default()));
        let request = authorized("/sleep/feedback", r#"{"email":"sleeper@example.com"}"#);

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_optimizer_descriptionはnullで返す() {
        let sut = create_test_app(Arc::new(StubSleepUseCase::default()));
        let request = authorized("/sleep/optimizer", r#"{"email":"sleeper@example.com"}"#);

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(
            body_json(response).await,
            serde_json::json!([{
                "updated_at": "2024-05-03T06:00:00Z",
                "target_temperature": 19.5,
                "target_humidity": 55.0,
                "description": null
            }])
        );
    }

    #[tokio::test]
    async fn test_authorizationヘッダーが無ければユースケースを呼ばずに401() {
        // Given
        let usecase = Arc::new(StubSleepUseCase::default());
        let sut = create_test_app(usecase.clone());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/sleep/recent")
            .body(Body::from("this is not json"))
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(usecase.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_小文字のbearerプレフィックスも除去する() {
        let usecase = Arc::new(StubSleepUseCase::default());
        let sut = create_test_app(usecase.clone());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/sleep/recent")
            .header("authorization", "bearer lower-token")
            .body(Body::from(r#"{"email":"sleeper@example.com"}"#))
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *usecase.received.lock().unwrap(),
            vec!["sleeper@example.com:lower-token".to_string()]
        );
    }

    #[tokio::test]
    async fn test_不正なjsonは400でユースケースを呼ばない() {
        let usecase = Arc::new(StubSleepUseCase::default());
        let sut = create_test_app(usecase.clone());
        let request = authorized("/sleep/calendar", r#"{"email": "#);

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(usecase.received.lock().unwrap().is_empty());
    }
}

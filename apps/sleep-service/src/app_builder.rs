//! # Sleep Service アプリケーション構築
//!
//! ルーター定義とミドルウェアの積み上げを担当する。
//! `main.rs` はインフラ初期化と State の組み立て、サーバー起動に集中する。
//!
//! ## ミドルウェアの順序（外側から）
//!
//! 1. `SetRequestIdLayer` - `X-Request-Id` を採番（UUID v7）
//! 2. `TraceLayer` - リクエストスパン
//! 3. `CanonicalLogLineLayer` - 1 リクエスト 1 行のサマリーログ
//! 4. `PropagateRequestIdLayer` - レスポンスへ `X-Request-Id` を複写
//! 5. `cors` - CORS ヘッダー付与、`OPTIONS` への即時応答
//! 6. `CatchPanicLayer` - ハンドラの panic を 500 に変換

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use nemuri_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    error::ServiceError,
    handler::{
        AuthState,
        ReadinessState,
        SleepState,
        calendar,
        daily_details,
        feedback,
        health_check,
        login,
        optimizer,
        readiness_check,
        recent,
        signup,
    },
    middleware::cors,
};

/// ルーターを構築する
pub fn build_app(
    auth_state: Arc<AuthState>,
    sleep_state: Arc<SleepState>,
    readiness_state: Arc<ReadinessState>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .merge(
            Router::new()
                .route("/auth/signup", post(signup))
                .route("/auth/login", post(login))
                .with_state(auth_state),
        )
        .merge(
            Router::new()
                .route("/sleep/calendar", post(calendar))
                .route("/sleep/daily-details", post(daily_details))
                .route("/sleep/recent", post(recent))
                .route("/sleep/feedback", post(feedback))
                .route("/sleep/optimizer", post(optimizer))
                .with_state(sleep_state),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(cors))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// panic を RFC 9457 形式の 500 に変換する
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ServiceError::Internal(format!("ハンドラが panic しました: {message}")).into_response()
}

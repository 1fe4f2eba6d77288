//! # Sleep Service エラー定義
//!
//! サービス固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンスボディは [`nemuri_shared::ErrorResponse`]（RFC 9457 Problem Details）。
//! 500 系は detail を固定文言にし、原因はログにのみ出力する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nemuri_domain::DomainError;
use nemuri_infra::InfraError;
use nemuri_shared::ErrorResponse;
use thiserror::Error;

/// Sleep Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 不正なリクエスト（JSON 形式不正、必須項目欠落、存在しない日付など）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// トークンが無い、または保存済みトークンと一致しない
    #[error("認証に失敗しました: {0}")]
    Unauthorized(String),

    /// メールアドレスとパスワードハッシュの組に一致するユーザーがいない
    #[error("ログインに失敗しました")]
    LoginFailed,

    /// トークンの有効期限切れ（厳格モードのみ）
    #[error("トークンの有効期限が切れています")]
    TokenExpired,

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 競合（メールアドレスの重複登録）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            e @ DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl ServiceError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            Self::Unauthorized(msg) => ErrorResponse::unauthorized(msg.clone()),
            Self::LoginFailed => ErrorResponse::login_failed(),
            Self::TokenExpired => ErrorResponse::token_expired(),
            Self::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            Self::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            Self::Database(_) | Self::Internal(_) => ErrorResponse::internal_error(),
        }
    }

    fn log(&self) {
        match self {
            Self::Database(e) => tracing::error!(
                error.category = "infrastructure",
                error.kind = e.kind_name(),
                span_trace = %e.span_trace(),
                "{e}"
            ),
            Self::Internal(msg) => tracing::error!(
                error.category = "internal",
                error.kind = "internal",
                "内部エラー: {msg}"
            ),
            _ => tracing::debug!(error = %self, "リクエストを拒否しました"),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        self.log();
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

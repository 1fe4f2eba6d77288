//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 睡眠記録サービスが返すエラーボディは `{type, title, status, detail}` の 4 フィールドに固定する。
//! `type` は [`ProblemType`] ごとに決まる URI で、クライアントはこの値で分岐する。
//!
//! axum の `IntoResponse` 変換はサービス側の責務で、この型は `serde` の対象であるだけ。

use serde::{Deserialize, Serialize};

/// `type` URI のベース
const ERROR_TYPE_BASE: &str = "https://nemuri.example.com/errors";

/// ログイン失敗時の固定 detail
///
/// 未登録とパスワード不一致でボディが変わらないようにする。
const LOGIN_FAILED_DETAIL: &str = "メールアドレスまたはパスワードが正しくありません";

/// 500 の固定 detail（原因はログにのみ出す）
const INTERNAL_ERROR_DETAIL: &str = "内部エラーが発生しました";

/// 問題の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    BadRequest,
    Unauthorized,
    LoginFailed,
    TokenExpired,
    NotFound,
    Conflict,
    InternalError,
}

impl ProblemType {
    /// `type` URI の末尾
    pub fn slug(self) -> &'static str {
        match self {
            Self::BadRequest => "bad-request",
            Self::Unauthorized => "unauthorized",
            Self::LoginFailed => "login-failed",
            Self::TokenExpired => "token-expired",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::InternalError => "internal-error",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::LoginFailed => "Login Failed",
            Self::TokenExpired => "Token Expired",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::InternalError => "Internal Server Error",
        }
    }

    pub fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized | Self::LoginFailed | Self::TokenExpired => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }

    pub fn uri(self) -> String {
        format!("{ERROR_TYPE_BASE}/{}", self.slug())
    }
}

/// エラーレスポンス本体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    /// 種類と detail から組み立てる
    pub fn of(problem: ProblemType, detail: impl Into<String>) -> Self {
        Self {
            error_type: problem.uri(),
            title:      problem.title().to_string(),
            status:     problem.status(),
            detail:     detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::of(ProblemType::BadRequest, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::of(ProblemType::Unauthorized, detail)
    }

    /// detail は固定。
    pub fn login_failed() -> Self {
        Self::of(ProblemType::LoginFailed, LOGIN_FAILED_DETAIL)
    }

    pub fn token_expired() -> Self {
        Self::of(
            ProblemType::TokenExpired,
            "トークンの有効期限が切れています",
        )
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::of(ProblemType::NotFound, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::of(ProblemType::Conflict, detail)
    }

    /// detail は固定。
    pub fn internal_error() -> Self {
        Self::of(ProblemType::InternalError, INTERNAL_ERROR_DETAIL)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ErrorResponse::bad_request("x"), "bad-request", 400)]
    #[case(ErrorResponse::unauthorized("x"), "unauthorized", 401)]
    #[case(ErrorResponse::login_failed(), "login-failed", 401)]
    #[case(ErrorResponse::token_expired(), "token-expired", 401)]
    #[case(ErrorResponse::not_found("x"), "not-found", 404)]
    #[case(ErrorResponse::conflict("x"), "conflict", 409)]
    #[case(ErrorResponse::internal_error(), "internal-error", 500)]
    fn test_便利コンストラクタのtypeとstatus(
        #[case] error: ErrorResponse,
        #[case] slug: &str,
        #[case] status: u16,
    ) {
        assert_eq!(
            error.error_type,
            format!("https://nemuri.example.com/errors/{slug}")
        );
        assert_eq!(error.status, status);
    }

    #[test]
    fn test_login_failedとinternal_errorのdetailは固定() {
        assert_eq!(ErrorResponse::login_failed(), ErrorResponse::login_failed());
        assert_eq!(ErrorResponse::login_failed().detail, LOGIN_FAILED_DETAIL);
        assert_eq!(ErrorResponse::internal_error().detail, INTERNAL_ERROR_DETAIL);
    }

    #[test]
    fn test_jsonではtypeフィールドとして出力される() {
        let error = ErrorResponse::not_found("睡眠セッションが見つかりません");

        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "https://nemuri.example.com/errors/not-found",
                "title": "Not Found",
                "status": 404,
                "detail": "睡眠セッションが見つかりません"
            })
        );
        let restored: ErrorResponse = serde_json::from_value(json).unwrap();
        assert_eq!(restored, error);
    }
}

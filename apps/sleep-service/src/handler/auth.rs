//! # 認証ハンドラ
//!
//! サインアップとログインのエンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /auth/signup` - ユーザー登録とトークン発行
//! - `POST /auth/login` - 資格情報の照合とトークン発行
//!
//! どちらも成功時は `{user, jwt_token}` を返す。

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use nemuri_domain::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    extract::JsonBody,
    usecase::{AuthUseCase, IssuedToken, LoginInput, SignupInput},
};

/// 認証ハンドラの共有状態
pub struct AuthState {
    pub usecase: Arc<dyn AuthUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// サインアップリクエスト
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email:         String,
    pub password_hash: String,
    pub name:          String,
}

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email:         String,
    pub password_hash: String,
}

/// ユーザー情報
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id:    Uuid,
    pub name:       String,
    pub email:      String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            user_id:    *user.id().as_uuid(),
            name:       user.name().as_str().to_string(),
            email:      user.email().as_str().to_string(),
            created_at: user.created_at(),
        }
    }
}

/// トークン発行レスポンス
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user:      UserDto,
    pub jwt_token: String,
}

impl From<IssuedToken> for AuthResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            user:      UserDto::from(&issued.user),
            jwt_token: issued.token.into_string(),
        }
    }
}

// --- ハンドラ ---

/// POST /auth/signup
///
/// メールアドレスが登録済みなら 409。
pub async fn signup(
    State(state): State<Arc<AuthState>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let issued = state
        .usecase
        .signup(SignupInput {
            email:         req.email,
            password_hash: req.password_hash,
            name:          req.name,
        })
        .await?;

    Ok(Json(AuthResponse::from(issued)))
}

/// POST /auth/login
///
/// メールアドレス不明とパスワード不一致は同じ 401 を返す。
pub async fn login(
    State(state): State<Arc<AuthState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let issued = state
        .usecase
        .login(LoginInput {
            email:         req.email,
            password_hash: req.password_hash,
        })
        .await?;

    Ok(Json(AuthResponse::from(issued)))
}

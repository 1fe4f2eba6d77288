//! # 認証ユースケース
//!
//! サインアップとログインを実装する。どちらも成功時に新しいトークンを発行し、
//! `users.jwt_token` を上書きする。上書きした時点で以前のトークンは失効する。
//!
//! ## ログイン失敗の扱い
//!
//! メールアドレスが未登録の場合も、パスワードハッシュが一致しない場合も、
//! 同じ `LoginFailed` を返す。形式として不正なメールアドレスも同様に扱う。

use std::sync::Arc;

use async_trait::async_trait;
use nemuri_domain::{
    DomainError,
    clock::Clock,
    token::{AccessToken, TokenClaims},
    user::{Email, NewUser, PasswordHash, User, UserId, UserName},
};
use nemuri_infra::{TokenCodec, repository::UserRepository};

use super::AuthUseCase;
use crate::error::ServiceError;

/// サインアップ入力
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email:         String,
    pub password_hash: String,
    pub name:          String,
}

/// ログイン入力
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email:         String,
    pub password_hash: String,
}

/// 発行結果
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user:  User,
    pub token: AccessToken,
}

/// 認証ユースケースの実装
pub struct AuthUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    token_codec:     Arc<dyn TokenCodec>,
    clock:           Arc<dyn Clock>,
}

impl AuthUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            token_codec,
            clock,
        }
    }

    /// トークンを発行して保存する
    async fn issue_token(&self, user: &User) -> Result<AccessToken, ServiceError> {
        let claims = TokenClaims::for_user(user, self.clock.now());
        let token = self.token_codec.issue(&claims)?;
        self.user_repository.update_token(user.id(), &token).await?;

        tracing::info!(user_id = %user.id(), exp = claims.exp, "トークンを発行しました");
        Ok(token)
    }
}

#[async_trait]
impl AuthUseCase for AuthUseCaseImpl {
    #[tracing::instrument(skip_all)]
    async fn signup(&self, input: SignupInput) -> Result<IssuedToken, ServiceError> {
        let new_user = NewUser {
            id:       UserId::new(),
            name:     UserName::new(input.name)?,
            email:    Email::new(input.email)?,
            password: PasswordHash::new(input.password_hash)?,
        };

        if self
            .user_repository
            .find_by_email(&new_user.email)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "メールアドレスは既に登録されています: {}",
                new_user.email
            ))
            .into());
        }

        // 事前確認の後に同じメールアドレスで登録された場合は一意制約違反になる
        let user = match self.user_repository.insert(&new_user).await {
            Ok(user) => user,
            Err(e) if e.as_conflict().is_some() => {
                return Err(ServiceError::Conflict(format!(
                    "メールアドレスは既に登録されています: {}",
                    new_user.email
                )));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = %user.id(), "ユーザーを登録しました");

        let token = self.issue_token(&user).await?;
        Ok(IssuedToken { user, token })
    }

    #[tracing::instrument(skip_all)]
    async fn login(&self, input: LoginInput) -> Result<IssuedToken, ServiceError> {
        if input.email.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "メールアドレスは必須です".to_string(),
            ));
        }
        let password = PasswordHash::new(input.password_hash)?;
        let email = Email::new(input.email).map_err(|_| ServiceError::LoginFailed)?;

        let user = self
            .user_repository
            .find_by_credentials(&email, &password)
            .await?
            .ok_or(ServiceError::LoginFailed)?;

        let token = self.issue_token(&user).await?;
        Ok(IssuedToken { user, token })
    }
}

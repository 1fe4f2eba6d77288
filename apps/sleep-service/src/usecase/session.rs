//! # セッション検証
//!
//! 提示されたトークンが、そのユーザーに最後に発行されたトークンかどうかを確認する。
//!
//! 既定では保存済みトークンとの照合（失効チェック）のみを行い、署名や有効期限は見ない。
//! 期限切れでも保存されたままのトークンは受け付ける。
//! 厳格モードでは照合に成功した後で [`TokenCodec::verify`] も通す。

use std::sync::Arc;

use nemuri_domain::{
    DomainError,
    token::{AccessToken, TokenVerification},
    user::{Email, UserId},
};
use nemuri_infra::{TokenCodec, repository::UserRepository};

use crate::error::ServiceError;

/// トークンの失効チェックを行うバリデータ
#[derive(Clone)]
pub struct SessionValidator {
    user_repository: Arc<dyn UserRepository>,
    token_codec:     Arc<dyn TokenCodec>,
    strict:          bool,
}

impl SessionValidator {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_codec: Arc<dyn TokenCodec>,
        strict: bool,
    ) -> Self {
        Self {
            user_repository,
            token_codec,
            strict,
        }
    }

    /// トークンを検証し、ユーザー ID を返す
    ///
    /// - メールアドレスのユーザーがいない: `NotFound`
    /// - 保存済みトークンが無い、または一致しない: `Unauthorized`
    /// - 厳格モードで期限切れ: `TokenExpired`、署名不正: `Unauthorized`
    #[tracing::instrument(skip_all, level = "debug")]
    pub async fn validate(
        &self,
        email: &Email,
        presented: &AccessToken,
    ) -> Result<UserId, ServiceError> {
        let stored = self
            .user_repository
            .find_token_by_email(email)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "User",
                id:          email.to_string(),
            })?;

        let matched = stored
            .jwt_token
            .as_ref()
            .is_some_and(|token| presented.matches(token));
        if !matched {
            tracing::debug!(user_id = %stored.user_id, "保存済みトークンと一致しません");
            return Err(ServiceError::Unauthorized(
                "トークンが無効です".to_string(),
            ));
        }

        if self.strict {
            match self.token_codec.verify(presented) {
                TokenVerification::Valid(_) => {}
                TokenVerification::Expired => return Err(ServiceError::TokenExpired),
                TokenVerification::Invalid => {
                    return Err(ServiceError::Unauthorized(
                        "トークンが無効です".to_string(),
                    ));
                }
            }
        }

        Ok(stored.user_id)
    }
}

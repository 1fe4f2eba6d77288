//! # UserRepository
//!
//! ユーザーと、ユーザーごとに1つだけ有効なアクセストークンの永続化を担当する。
//!
//! ## 設計方針
//!
//! - **資格情報の照合は SQL で完結**: メールアドレスとパスワードハッシュの組で検索する
//! - **一意制約違反は Conflict**: 同時サインアップで重複した場合も 409 にできるよう変換する
//! - **トークンは上書き**: 新しいトークンの保存は単一の UPDATE で以前の値を置き換える

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nemuri_domain::{
    token::AccessToken,
    user::{Email, NewUser, PasswordHash, User, UserId, UserName},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 保存済みトークンの照合に必要な情報
#[derive(Debug, Clone)]
pub struct StoredToken {
    pub user_id:   UserId,
    /// 最後に発行されたトークン（未発行なら `None`）
    pub jwt_token: Option<AccessToken>,
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// メールアドレスでユーザーを検索する
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// メールアドレスとパスワードハッシュの組でユーザーを検索する
    ///
    /// メールアドレス不明とハッシュ不一致はどちらも `Ok(None)` になり、区別できない。
    async fn find_by_credentials(
        &self,
        email: &Email,
        password: &PasswordHash,
    ) -> Result<Option<User>, InfraError>;

    /// ユーザーを登録する
    ///
    /// `created_at` はデータベースが採番した値を返す。
    /// メールアドレスが既に登録済みなら `InfraErrorKind::Conflict`。
    async fn insert(&self, user: &NewUser) -> Result<User, InfraError>;

    /// 有効なトークンを置き換える
    async fn update_token(&self, id: &UserId, token: &AccessToken) -> Result<(), InfraError>;

    /// メールアドレスから保存済みトークンを取得する
    async fn find_token_by_email(&self, email: &Email) -> Result<Option<StoredToken>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id:    Uuid,
    name:       String,
    email:      String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::new(
            UserId::from_uuid(row.user_id),
            UserName::new(row.name).map_err(|e| InfraError::unexpected(e.to_string()))?,
            Email::new(row.email).map_err(|e| InfraError::unexpected(e.to_string()))?,
            row.created_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct StoredTokenRow {
    user_id:   Uuid,
    jwt_token: Option<String>,
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, email, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_credentials(
        &self,
        email: &Email,
        password: &PasswordHash,
    ) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, email, created_at
            FROM users
            WHERE email = $1 AND password = $2
            "#,
        )
        .bind(email.as_str())
        .bind(password.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id))]
    async fn insert(&self, user: &NewUser) -> Result<User, InfraError> {
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_id, name, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, name, email, created_at
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => User::try_from(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(InfraError::conflict("User", user.email.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update_token(&self, id: &UserId, token: &AccessToken) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET jwt_token = $1
            WHERE user_id = $2
            "#,
        )
        .bind(token.as_str())
        .bind(*id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::unexpected(format!(
                "トークン更新対象のユーザーが存在しません: {id}"
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_token_by_email(&self, email: &Email) -> Result<Option<StoredToken>, InfraError> {
        let row = sqlx::query_as::<_, StoredTokenRow>(
            r#"
            SELECT user_id, jwt_token
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredToken {
            user_id:   UserId::from_uuid(row.user_id),
            jwt_token: row.jwt_token.map(AccessToken::new),
        }))
    }
}

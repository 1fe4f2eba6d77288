//! # アクセストークン
//!
//! ログイン・サインアップで発行される Bearer トークンと、その中に埋め込むクレームを定義する。
//!
//! ## 不変条件
//!
//! 1ユーザーにつき有効なトークンは常に1つ（`users.jwt_token` に保存された最新のもの）。
//! 新しいトークンを発行すると、期限内であっても以前のトークンは即座に無効になる。
//! `jti` により同一秒内に2回発行しても異なるトークンになる。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::user::{User, UserId};

/// トークンの有効期間（日）
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Bearer スキームのプレフィックス（大文字小文字を区別しない）
const BEARER_PREFIX: &str = "bearer ";

/// シリアライズ済みのアクセストークン
///
/// Debug 出力ではトークン値をマスクする。
/// 比較は [`matches`](AccessToken::matches) で定数時間に行う。
#[derive(Clone)]
pub struct AccessToken(String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `Authorization` ヘッダーの値からトークンを取り出す
    ///
    /// 先頭の `Bearer `（7 バイト）は大文字小文字を問わず除去する。プレフィックスがなければ
    /// 値全体をトークンとみなす。残りは保存値とバイト単位で比較するため空白も含めて
    /// そのまま保持し、空の場合のみ `None`。
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let token = match value.get(..BEARER_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
                &value[BEARER_PREFIX.len()..]
            }
            _ => value,
        };

        if token.is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 保存済みトークンとバイト列として一致するか（定数時間比較）
    pub fn matches(&self, stored: &AccessToken) -> bool {
        self.0.as_bytes().ct_eq(stored.0.as_bytes()).into()
    }
}

/// トークンに埋め込むクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub email:   String,
    pub name:    String,
    /// 発行時刻（UNIX 秒）
    pub iat:     i64,
    /// 有効期限（UNIX 秒）
    pub exp:     i64,
    /// トークン ID
    pub jti:     String,
}

impl TokenClaims {
    /// ユーザーと発行時刻からクレームを組み立てる
    ///
    /// 有効期限は発行時刻の [`TOKEN_LIFETIME_DAYS`] 日後。
    pub fn for_user(user: &User, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at + Duration::days(TOKEN_LIFETIME_DAYS);
        Self {
            user_id: user.id().clone(),
            email:   user.email().as_str().to_string(),
            name:    user.name().as_str().to_string(),
            iat:     issued_at.timestamp(),
            exp:     expires_at.timestamp(),
            jti:     uuid::Uuid::now_v7().to_string(),
        }
    }
}

/// トークン検証結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerification {
    /// 署名・期限ともに有効
    Valid(TokenClaims),
    /// 署名は正しいが期限切れ
    Expired,
    /// 署名不正・形式不正・アルゴリズム不一致
    Invalid,
}

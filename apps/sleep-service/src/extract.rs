//! # リクエスト抽出
//!
//! ハンドラ引数として使う axum extractor を定義する。
//!
//! - [`BearerToken`]: `Authorization` ヘッダーからトークンを取り出す。ボディより先に評価される
//! - [`JsonBody`]: ボディを一度だけ読み、JSON として型付きでデシリアライズする
//!
//! どちらも失敗時は [`ServiceError`] を返すので、エラーボディは他のエラーと同じ形になる。

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
};
use nemuri_domain::token::AccessToken;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use crate::error::ServiceError;

/// `Authorization` ヘッダーのアクセストークン
///
/// ヘッダーが無い、または `Bearer ` を除いた残りが空なら 401。
#[derive(Debug, Clone)]
pub struct BearerToken(pub AccessToken);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(AccessToken::from_authorization_header)
            .map(Self)
            .ok_or_else(|| {
                ServiceError::Unauthorized("Authorization ヘッダーがありません".to_string())
            })
    }
}

/// JSON リクエストボディ
///
/// `Content-Type` は問わない。ボディ全体が JSON 文字列の場合（ゲートウェイが二重に
/// エンコードした形）は中身をもう一度 JSON として解釈する。
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            ServiceError::BadRequest(format!("リクエストボディを読み取れません: {e}"))
        })?;
        parse_body(&bytes).map(Self)
    }
}

/// リクエストボディを型付きで解釈する
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServiceError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ServiceError::BadRequest(
            "リクエストボディが空です".to_string(),
        ));
    }

    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(malformed)?;
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner).map_err(malformed)?,
        other => other,
    };

    serde_json::from_value(value).map_err(malformed)
}

fn malformed(e: serde_json::Error) -> ServiceError {
    ServiceError::BadRequest(format!("リクエストボディの形式が不正です: {e}"))
}

/// JSON の整数、または数字だけの文字列を `i64` として受け付ける
///
/// `#[serde(deserialize_with = "lenient_i64")]` で使う。
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Str(value) => value.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("整数として解釈できません: {value:?}"))
        }),
    }
}

//! # トークンコーデック
//!
//! アクセストークンの署名（発行）と検証を行う。
//!
//! - アルゴリズムは HS256 固定。ヘッダーの `alg` が異なるトークンは不正扱い
//! - 署名鍵はプロセス全体で1つ（設定 `JWT_SECRET`）
//! - 有効期限の判定には注入された [`Clock`] を使い、猶予（leeway）は設けない
//!
//! 発行したトークンを `users.jwt_token` に保存する副作用はユースケース側の責務。

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use nemuri_domain::{
    clock::Clock,
    token::{AccessToken, TokenClaims, TokenVerification},
};

use crate::error::InfraError;

/// トークンの発行・検証トレイト
pub trait TokenCodec: Send + Sync {
    /// クレームに署名してトークンを発行する
    fn issue(&self, claims: &TokenClaims) -> Result<AccessToken, InfraError>;

    /// 署名・アルゴリズム・有効期限を検証する
    fn verify(&self, token: &AccessToken) -> TokenVerification;
}

/// HS256 による [`TokenCodec`] 実装
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation:   Validation,
    clock:        Arc<dyn Clock>,
}

impl JwtTokenCodec {
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 期限は Clock で判定する（テストで時刻を固定できるように）
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, claims: &TokenClaims) -> Result<AccessToken, InfraError> {
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?;
        Ok(AccessToken::new(token))
    }

    fn verify(&self, token: &AccessToken) -> TokenVerification {
        let data = match jsonwebtoken::decode::<TokenClaims>(
            token.as_str(),
            &self.decoding_key,
            &self.validation,
        ) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "トークンの検証に失敗しました");
                return TokenVerification::Invalid;
            }
        };

        if data.claims.exp < self.clock.now().timestamp() {
            return TokenVerification::Expired;
        }
        TokenVerification::Valid(data.claims)
    }
}

//! # ユーザー
//!
//! ユーザーエンティティと、それに付随する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`User`] | ユーザー | サインアップで作成され、削除されない |
//! | [`Email`] | メールアドレス | ユーザーを一意に識別する |
//! | [`PasswordHash`] | パスワードハッシュ | クライアント側でハッシュ化済みの不透明な資格情報 |
//!
//! パスワードはクライアントがハッシュ化して送信する。サービスはハッシュ方式に関知せず、
//! 保存値との完全一致でのみ照合する。

use chrono::{DateTime, Utc};

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID
    ///
    /// UUID v7 をサービス側で採番する。
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー名
    pub struct UserName {
        label: "ユーザー名",
        max_length: 100,
    }
}

/// パスワードハッシュの最大長
const PASSWORD_HASH_MAX_LENGTH: usize = 255;

/// パスワードハッシュ
///
/// 保存・照合ともに受け取った文字列をそのまま使う。前後の空白も値の一部として扱い、
/// trim はしない。Debug 出力はマスクされる。
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[REDACTED]").finish()
    }
}

impl PasswordHash {
    /// 空文字列と最大長超過のみを拒否する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "パスワードハッシュは必須です".to_string(),
            ));
        }

        if value.chars().count() > PASSWORD_HASH_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "パスワードハッシュは {PASSWORD_HASH_MAX_LENGTH} 文字以内である必要があります"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// メールアドレス（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白を除いて空文字列ではない
    /// - `local@domain` の形式で、どちらも空ではない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `email` は全ユーザーで一意
/// - `created_at` は作成後に変わらない
///
/// 有効なトークン（`jwt_token`）はログイン・サインアップのたびに上書きされる可変状態なので
/// エンティティには含めず、リポジトリ経由で個別に読み書きする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:         UserId,
    name:       UserName,
    email:      Email,
    created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, name: UserName, email: Email, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// サインアップで登録するユーザー
///
/// `created_at` はデータベース側で採番されるため持たない。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id:       UserId,
    pub name:     UserName,
    pub email:    Email,
    pub password: PasswordHash,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("sleeper@example.com")]
    #[case("a@b")]
    #[case("night.owl+alarm@sub.example.jp")]
    fn test_email_正常な形式を受け付ける(#[case] input: &str) {
        let email = Email::new(input).unwrap();
        assert_eq!(email.as_str(), input);
    }

    #[rstest]
    #[case("", "メールアドレスは必須です")]
    #[case("   ", "メールアドレスは必須です")]
    #[case("no-at-mark", "メールアドレスの形式が不正です")]
    #[case("@example.com", "メールアドレスの形式が不正です")]
    #[case("sleeper@", "メールアドレスの形式が不正です")]
    #[case("a@b@c", "メールアドレスの形式が不正です")]
    fn test_email_不正な形式を拒否する(#[case] input: &str, #[case] message: &str) {
        let result = Email::new(input);

        assert!(matches!(result, Err(DomainError::Validation(m)) if m == message));
    }

    #[test]
    fn test_email_前後の空白を除去する() {
        let email = Email::new(" sleeper@example.com\n").unwrap();
        assert_eq!(email.as_str(), "sleeper@example.com");
    }

    #[test]
    fn test_email_255文字を超えると拒否する() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(Email::new(long).is_err());
    }

    #[test]
    fn test_user_name_空文字列を拒否する() {
        let result = UserName::new("  ");
        assert!(matches!(result, Err(DomainError::Validation(m)) if m == "ユーザー名は必須です"));
    }

    #[test]
    fn test_password_hash_のdebug出力はマスクされる() {
        let hash = PasswordHash::new("d74ff0ee8da3b9806b18c877dbf29bbde50b5bd8").unwrap();

        let debug = format!("{hash:?}");

        assert_eq!(debug, r#"PasswordHash("[REDACTED]")"#);
        assert_eq!(hash.as_str(), "d74ff0ee8da3b9806b18c877dbf29bbde50b5bd8");
    }

    #[test]
    fn test_password_hash_前後の空白を保持する() {
        let hash = PasswordHash::new("  abc  ").unwrap();

        assert_eq!(hash.as_str(), "  abc  ");
        assert_ne!(hash, PasswordHash::new("abc").unwrap());
    }

    #[rstest]
    #[case(String::new())]
    #[case("a".repeat(256))]
    fn test_password_hash_空文字列と最大長超過を拒否する(#[case] input: String) {
        assert!(PasswordHash::new(input).is_err());
    }

    #[test]
    fn test_password_hash_空白のみでも値として受け付ける() {
        let hash = PasswordHash::new(" ").unwrap();
        assert_eq!(hash.as_str(), " ");
    }

    #[test]
    fn test_user_id_はuuid_v7で採番される() {
        let id = UserId::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }
}

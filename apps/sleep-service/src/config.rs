//! # Sleep Service 設定
//!
//! 環境変数から睡眠記録サービスの設定を読み込む。
//!
//! 設定は起動時に一度だけ組み立て、ユースケースやハンドラには値として渡す。
//! ハンドラの中で環境変数を読むことはない。

use std::{env, fmt, str::FromStr};

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// `DB_PORT` 未設定時のポート番号
const DEFAULT_DB_PORT: u16 = 5432;

/// 設定の読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定または空
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// トークン署名鍵
///
/// Debug 出力はマスクされる。
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JwtSecret").field(&"[REDACTED]").finish()
    }
}

/// データベース接続先
///
/// `DATABASE_URL` があればそれを使い、なければ `DB_*` の各変数から組み立てる。
#[derive(Clone)]
pub enum DatabaseConfig {
    Url(String),
    Parts {
        host:     String,
        port:     u16,
        user:     String,
        password: String,
        name:     String,
    },
}

impl DatabaseConfig {
    /// sqlx の接続オプションに変換する
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            Self::Url(url) => PgConnectOptions::from_str(url),
            Self::Parts {
                host,
                port,
                user,
                password,
                name,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(name)),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // URL には資格情報が含まれ得る
            Self::Url(_) => f.debug_tuple("Url").field(&"[REDACTED]").finish(),
            Self::Parts {
                host,
                port,
                user,
                name,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"[REDACTED]")
                .field("name", name)
                .finish(),
        }
    }
}

/// Sleep Service サーバーの設定
#[derive(Debug, Clone)]
pub struct SleepServiceConfig {
    /// バインドアドレス
    pub host:                String,
    /// ポート番号
    pub port:                u16,
    /// データベース接続先
    pub database:            DatabaseConfig,
    /// トークン署名鍵（HS256）
    pub jwt_secret:          JwtSecret,
    /// 保存済みトークンとの照合に加えて署名・有効期限も検証するか
    pub token_verify_strict: bool,
    /// 起動時にマイグレーションを適用するか
    pub run_migrations:      bool,
}

impl SleepServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定とみなす。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Parts {
                host:     require("DB_HOST")?,
                port:     match get("DB_PORT") {
                    Some(value) => parse_port("DB_PORT", value)?,
                    None => DEFAULT_DB_PORT,
                },
                user:     require("DB_USER")?,
                password: require("DB_PASSWORD")?,
                name:     require("DB_NAME")?,
            },
        };

        Ok(Self {
            host: get("SLEEP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_port("SLEEP_PORT", require("SLEEP_PORT")?)?,
            database,
            jwt_secret: JwtSecret(require("JWT_SECRET")?),
            token_verify_strict: parse_flag("TOKEN_VERIFY_STRICT", get("TOKEN_VERIFY_STRICT"))?,
            run_migrations: parse_flag("RUN_MIGRATIONS", get("RUN_MIGRATIONS"))?,
        })
    }
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

/// `true` / `false` / `1` / `0` を受け付ける（大文字小文字は区別しない）
fn parse_flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

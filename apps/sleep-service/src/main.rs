//! # Sleep Service サーバー
//!
//! 睡眠記録アプリのバックエンド API サーバー。
//!
//! ## 役割
//!
//! - **認証**: サインアップ・ログインで HS256 トークンを発行し、`users.jwt_token` に保存する
//! - **睡眠データ参照**: カレンダー、日別詳細、直近セッション、フィードバック、推奨寝室環境
//!
//! 保護されたエンドポイントは、提示されたトークンが保存済みトークンと一致する場合のみ応答する。
//! ログインし直すと以前のトークンは使えなくなる。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SLEEP_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `SLEEP_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | ※ | PostgreSQL 接続 URL |
//! | `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME` | ※ | `DATABASE_URL` が無い場合の接続情報（`DB_PORT` のデフォルト: `5432`） |
//! | `JWT_SECRET` | **Yes** | トークン署名鍵 |
//! | `TOKEN_VERIFY_STRICT` | No | `true` で署名・有効期限も検証する（デフォルト: `false`） |
//! | `RUN_MIGRATIONS` | No | `true` で起動時にマイグレーションを適用する（デフォルト: `false`） |
//! | `LOG_FORMAT` | No | `json` で JSON ログを出力する |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p nemuri-sleep-service
//!
//! # 本番環境
//! SLEEP_PORT=13100 DATABASE_URL=postgres://... JWT_SECRET=... cargo run -p nemuri-sleep-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use nemuri_domain::clock::{Clock, SystemClock};
use nemuri_infra::{
    JwtTokenCodec,
    TokenCodec,
    db,
    repository::{
        FeedbackRepository,
        OptimalConditionRepository,
        PostgresFeedbackRepository,
        PostgresOptimalConditionRepository,
        PostgresSleepRepository,
        PostgresUserRepository,
        SleepRepository,
        UserRepository,
    },
};
use nemuri_shared::observability::{TracingConfig, init_tracing};
use nemuri_sleep_service::{
    app_builder::build_app,
    config::SleepServiceConfig,
    handler::{AuthState, ReadinessState, SleepState},
    usecase::{AuthUseCaseImpl, SessionValidator, SleepUseCaseImpl},
};
use tokio::net::TcpListener;

/// Sleep Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("sleep-service"));
    let _tracing_guard = tracing::info_span!("app", service = "sleep-service").entered();

    // 設定読み込み
    let config = SleepServiceConfig::from_env()?;

    tracing::info!(
        strict = config.token_verify_strict,
        "Sleep Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(config.database.connect_options()?).await?;
    tracing::info!("データベースに接続しました");

    if config.run_migrations {
        db::run_migrations(&pool).await?;
        tracing::info!("マイグレーションを適用しました");
    }

    // Readiness Check 用 State（pool が move される前に clone）
    let readiness_state = Arc::new(ReadinessState { pool: pool.clone() });

    // 依存コンポーネントを初期化
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(
        config.jwt_secret.as_bytes(),
        clock.clone(),
    ));
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let sleep_repository: Arc<dyn SleepRepository> =
        Arc::new(PostgresSleepRepository::new(pool.clone()));
    let feedback_repository: Arc<dyn FeedbackRepository> =
        Arc::new(PostgresFeedbackRepository::new(pool.clone()));
    let optimal_condition_repository: Arc<dyn OptimalConditionRepository> =
        Arc::new(PostgresOptimalConditionRepository::new(pool));

    let session_validator = SessionValidator::new(
        user_repository.clone(),
        token_codec.clone(),
        config.token_verify_strict,
    );
    let auth_state = Arc::new(AuthState {
        usecase: Arc::new(AuthUseCaseImpl::new(user_repository, token_codec, clock)),
    });
    let sleep_state = Arc::new(SleepState {
        usecase: Arc::new(SleepUseCaseImpl::new(
            session_validator,
            sleep_repository,
            feedback_repository,
            optimal_condition_repository,
        )),
    });

    let app = build_app(auth_state, sleep_state, readiness_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Sleep Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

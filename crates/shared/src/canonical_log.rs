//! # Canonical Log Line ミドルウェア
//!
//! リクエスト 1 件につき 1 行、完了時に要点（メソッド、パス、ステータス、所要時間、
//! リクエスト ID）をまとめて出力する tower Layer。
//!
//! ログレベルはステータスで決める。5xx は `error`、4xx は `warn`、それ以外は `info`。
//! 401 や 404 は利用者側の誤りなので、障害と区別できるようにしている。
//!
//! `TraceLayer` の内側、`SetRequestIdLayer` より内側に置く前提
//! （`X-Request-Id` ヘッダーが採番済みであること）。

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use http::{Request, Response, StatusCode};
use tower::{Layer, Service};

use crate::observability::REQUEST_ID_HEADER;

/// プローブ用パスは高頻度で叩かれるため出力しない
fn is_health_check_path(path: &str) -> bool {
    path.starts_with("/health")
}

/// 1 行に載せるリクエスト側の情報
struct RequestLine {
    method:     String,
    path:       String,
    request_id: String,
    started:    Instant,
}

impl RequestLine {
    fn capture<B>(req: &Request<B>) -> Self {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_owned();
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_owned(),
            request_id,
            started: Instant::now(),
        }
    }

    fn latency_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn emit_completed(&self, status: StatusCode) {
        macro_rules! emit {
            ($level:ident) => {
                tracing::$level!(
                    log.r#type = "canonical",
                    http.method = %self.method,
                    http.path = %self.path,
                    http.status_code = status.as_u16(),
                    http.latency_ms = self.latency_ms(),
                    request_id = %self.request_id,
                    "リクエスト完了"
                )
            };
        }

        if status.is_server_error() {
            emit!(error);
        } else if status.is_client_error() {
            emit!(warn);
        } else {
            emit!(info);
        }
    }

    fn emit_failed(&self, err: &dyn std::fmt::Display) {
        tracing::error!(
            log.r#type = "canonical",
            http.method = %self.method,
            http.path = %self.path,
            http.latency_ms = self.latency_ms(),
            request_id = %self.request_id,
            error.message = %err,
            "リクエスト処理エラー"
        );
    }
}

/// Canonical Log Line を出力する Layer
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalLogLineLayer;

impl<S> Layer<S> for CanonicalLogLineLayer {
    type Service = CanonicalLogLineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CanonicalLogLineService { inner }
    }
}

/// [`CanonicalLogLineLayer`] が生成する Service
#[derive(Clone, Debug)]
pub struct CanonicalLogLineService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CanonicalLogLineService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // poll_ready 済みの inner を使う
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if is_health_check_path(req.uri().path()) {
            return Box::pin(inner.call(req));
        }

        let line = RequestLine::capture(&req);
        Box::pin(async move {
            let result = inner.call(req).await;
            match &result {
                Ok(response) => line.emit_completed(response.status()),
                Err(err) => line.emit_failed(err),
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[derive(Clone)]
    struct FixedStatusService {
        status: StatusCode,
    }

    impl Service<Request<()>> for FixedStatusService {
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
        type Response = Response<()>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<()>) -> Self::Future {
            let status = self.status;
            Box::pin(async move { Ok(Response::builder().status(status).body(()).unwrap()) })
        }
    }

    #[derive(Clone)]
    struct FailingService;

    impl Service<Request<()>> for FailingService {
        type Error = String;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
        type Response = Response<()>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<()>) -> Self::Future {
            Box::pin(async { Err("connection reset".to_string()) })
        }
    }

    #[derive(Debug, Clone)]
    struct CapturedEvent {
        level:   tracing::Level,
        message: String,
        fields:  Vec<(String, String)>,
    }

    impl CapturedEvent {
        fn field(&self, name: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// ログイベントをキャプチャする Layer
    #[derive(Clone)]
    struct CaptureLayer {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);

            self.events.lock().unwrap().push(CapturedEvent {
                level:   *event.metadata().level(),
                message: visitor.message.unwrap_or_default(),
                fields:  visitor.fields,
            });
        }
    }

    #[derive(Default)]
    struct FieldVisitor {
        message: Option<String>,
        fields:  Vec<(String, String)>,
    }

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            let rendered = format!("{value:?}");
            if field.name() == "message" {
                self.message = Some(rendered);
            } else {
                self.fields.push((field.name().to_string(), rendered));
            }
        }

        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                self.message = Some(value.to_string());
            } else {
                self.fields
                    .push((field.name().to_string(), value.to_string()));
            }
        }
    }

    /// 返り値の `DefaultGuard` はテスト終了までスコープに保持すること
    fn setup_capture() -> (
        tracing::subscriber::DefaultGuard,
        Arc<Mutex<Vec<CapturedEvent>>>,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            events: events.clone(),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        (guard, events)
    }

    fn post(path: &str) -> Request<()> {
        Request::builder()
            .method(http::Method::POST)
            .uri(path)
            .header(REQUEST_ID_HEADER, "0190a0d0-0000-7000-8000-00000000abcd")
            .body(())
            .unwrap()
    }

    fn fixed(status: StatusCode) -> CanonicalLogLineService<FixedStatusService> {
        CanonicalLogLineLayer.layer(FixedStatusService { status })
    }

    #[test]
    fn test_is_health_check_path() {
        assert!(is_health_check_path("/health"));
        assert!(is_health_check_path("/health/ready"));
        assert!(!is_health_check_path("/sleep/calendar"));
    }

    #[tokio::test]
    async fn test_正常リクエストでサマリが1行出力される() {
        // Given
        let (_guard, events) = setup_capture();
        let mut sut = fixed(StatusCode::OK);

        // When
        let response = sut.call(post("/sleep/recent")).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let event = &captured[0];
        assert_eq!(event.level, tracing::Level::INFO);
        assert_eq!(event.message, "リクエスト完了");
        assert_eq!(event.field("log.type"), Some("canonical"));
        assert_eq!(event.field("http.method"), Some("POST"));
        assert_eq!(event.field("http.path"), Some("/sleep/recent"));
        assert_eq!(event.field("http.status_code"), Some("200"));
        assert_eq!(
            event.field("request_id"),
            Some("0190a0d0-0000-7000-8000-00000000abcd")
        );
        assert!(event.field("http.latency_ms").is_some());
    }

    #[rstest::rstest]
    #[case::クライアントエラー(StatusCode::UNAUTHORIZED, tracing::Level::WARN)]
    #[case::見つからない(StatusCode::NOT_FOUND, tracing::Level::WARN)]
    #[case::サーバーエラー(StatusCode::INTERNAL_SERVER_ERROR, tracing::Level::ERROR)]
    #[tokio::test]
    async fn test_ステータスに応じたレベルで出力される(
        #[case] status: StatusCode,
        #[case] expected: tracing::Level,
    ) {
        let (_guard, events) = setup_capture();
        let mut sut = fixed(status);

        sut.call(post("/sleep/feedback")).await.unwrap();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].level, expected);
        assert_eq!(
            captured[0].field("http.status_code"),
            Some(status.as_str())
        );
    }

    #[tokio::test]
    async fn test_リクエストidが無ければハイフンを記録する() {
        let (_guard, events) = setup_capture();
        let mut sut = fixed(StatusCode::OK);
        let request = Request::builder().uri("/auth/login").body(()).unwrap();

        sut.call(request).await.unwrap();

        assert_eq!(events.lock().unwrap()[0].field("request_id"), Some("-"));
    }

    #[tokio::test]
    async fn test_healthパスでは出力されない() {
        let (_guard, events) = setup_capture();
        let mut sut = fixed(StatusCode::OK);

        sut.call(post("/health")).await.unwrap();
        sut.call(post("/health/ready")).await.unwrap();

        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_serviceエラー時にerrorレベルで出力される() {
        let (_guard, events) = setup_capture();
        let mut sut = CanonicalLogLineLayer.layer(FailingService);

        let result = sut.call(post("/auth/login")).await;

        assert!(result.is_err());
        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].level, tracing::Level::ERROR);
        assert_eq!(captured[0].message, "リクエスト処理エラー");
        assert_eq!(captured[0].field("error.message"), Some("connection reset"));
    }
}

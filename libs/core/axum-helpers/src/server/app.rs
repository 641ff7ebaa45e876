use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::{
    HeaderLimit, REQUEST_ID_HEADER, client_ip_middleware, create_cors_layer, handle_panic,
    header_size_guard, propagate_request_id_layer, security_headers, set_request_id_layer,
};
use axum::{Router, body::Body, extract::Request, http::StatusCode, middleware};
use core_config::server::ServerConfig;
use observability::metrics_middleware;
use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

/// Settings for the cross-cutting HTTP layers.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub request_timeout: Duration,
    pub max_header_size: usize,
    /// Empty means any origin without credentials
    pub cors_allowed_origins: Vec<String>,
    pub security_headers: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_header_size: 1_048_576,
            cors_allowed_origins: Vec::new(),
            security_headers: true,
        }
    }
}

/// Wraps `router` with the JSON 404 fallback and the full middleware stack.
///
/// Outermost first: request id, access log, CORS, compression, security
/// headers (optional), HTTP metrics, panic recovery, client IP,
/// header-size guard, request timeout.
pub fn apply_middleware(router: Router, options: &HttpOptions) -> Router {
    // `Router::layer` wraps what is already there, so layers are added
    // innermost first.
    let mut router = router
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(middleware::from_fn_with_state(
            HeaderLimit(options.max_header_size),
            header_size_guard,
        ))
        .layer(middleware::from_fn(client_ip_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(metrics_middleware));

    if options.security_headers {
        router = router.layer(middleware::from_fn(security_headers));
    }

    router
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(&options.cors_allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                        client_ip = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

/// Binds a TCP listener on the configured address.
pub async fn bind(server_config: &ServerConfig) -> io::Result<TcpListener> {
    TcpListener::bind(server_config.address()).await
}

/// Serves `router` until the coordinator signals shutdown.
///
/// After the signal, in-flight requests get `grace` to complete. When the
/// grace period runs out the remaining connections are dropped and the
/// function still returns `Ok`.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    coordinator: ShutdownCoordinator,
    grace: Duration,
) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Server listening on {}", addr);

    let drain_signal = coordinator.clone();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { drain_signal.notified().await })
    .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.inspect_err(|e| tracing::error!("Server on {} failed: {:?}", addr, e));
        }
        _ = coordinator.notified() => {}
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            info!("Server on {} drained", addr);
            result
        }
        Err(_) => {
            warn!(
                "Server on {} did not drain within {:?}, dropping open connections",
                addr, grace
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn stack(options: &HttpOptions) -> Router {
        let routes = Router::new()
            .route("/hello", get(|| async { "hi" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        apply_middleware(routes, options)
    }

    #[tokio::test]
    async fn test_stack_sets_request_id_and_security_headers() {
        let response = stack(&HttpOptions::default())
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_security_headers_can_be_disabled() {
        let options = HttpOptions {
            security_headers: false,
            ..HttpOptions::default()
        };
        let response = stack(&options)
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(!response.headers().contains_key("x-frame-options"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let response = stack(&HttpOptions::default())
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 404);
    }

    mod span_capture {
        use std::fmt;
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing::span::{Id, Record};
        use tracing::Subscriber;
        use tracing_subscriber::layer::{Context, Layer};

        /// Collects every value recorded on a span after creation.
        #[derive(Clone, Default)]
        pub struct RecordedFields(pub Arc<Mutex<Vec<(String, String)>>>);

        impl RecordedFields {
            pub fn get(&self, name: &str) -> Option<String> {
                let fields = self.0.lock().unwrap();
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
            }
        }

        struct Collect<'a>(&'a mut Vec<(String, String)>);

        impl Visit for Collect<'_> {
            fn record_str(&mut self, field: &Field, value: &str) {
                self.0.push((field.name().to_string(), value.to_string()));
            }

            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                self.0.push((field.name().to_string(), format!("{value:?}")));
            }
        }

        impl<S: Subscriber> Layer<S> for RecordedFields {
            fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
                let mut fields = self.0.lock().unwrap();
                values.record(&mut Collect(&mut fields));
            }
        }
    }

    #[tokio::test]
    async fn test_client_ip_is_recorded_on_request_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let recorded = span_capture::RecordedFields::default();
        let subscriber = tracing_subscriber::registry().with(recorded.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let response = stack(&HttpOptions::default())
            .oneshot(
                Request::builder()
                    .uri("/hello")
                    .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(recorded.get("client_ip").as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let options = HttpOptions {
            request_timeout: Duration::from_millis(50),
            ..HttpOptions::default()
        };
        let response = stack(&options)
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_header_limit_applies() {
        let options = HttpOptions {
            max_header_size: 32,
            ..HttpOptions::default()
        };
        let response = stack(&options)
            .oneshot(
                Request::builder()
                    .uri("/hello")
                    .header("x-padding", "p".repeat(64))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_serve_returns_after_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let coordinator = ShutdownCoordinator::new();
        let router = Router::new().route("/hello", get(|| async { "hi" }));

        let handle = tokio::spawn(serve(
            listener,
            router,
            coordinator.clone(),
            Duration::from_millis(200),
        ));
        tokio::task::yield_now().await;
        coordinator.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server stopped")
            .unwrap();
        assert!(result.is_ok());
    }
}

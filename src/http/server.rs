//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout)
//! - Bind server to listener and stop on the shutdown broadcast

use std::time::Duration;
use axum::{
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::HttpConfig;
use crate::http::handlers::{self, MAX_AGGREGATE_TIMEOUT_MS};
use crate::registry::RegistryClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: RegistryClient,
}

/// HTTP facade in front of the registry.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server talking to the registry through `client`.
    pub fn new(client: RegistryClient, config: &HttpConfig) -> Self {
        let request_timeout = config.ask_timeout() + Duration::from_millis(MAX_AGGREGATE_TIMEOUT_MS);
        let router = Self::build_router(AppState { client }, request_timeout);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/status", get(handlers::get_status))
            .route("/groups", get(handlers::list_groups))
            .route("/groups/{group}/devices", get(handlers::list_devices))
            .route(
                "/groups/{group}/devices/{device}",
                axum::routing::post(handlers::track_device).delete(handlers::passivate_device),
            )
            .route(
                "/groups/{group}/devices/{device}/reading",
                get(handlers::read_device).put(handlers::record_reading),
            )
            .route("/groups/{group}/readings", get(handlers::group_readings))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server() -> (HttpServer, broadcast::Sender<()>) {
        let (shutdown, rx) = broadcast::channel(1);
        let client = RegistryClient::new(Registry::spawn(rx), Duration::from_secs(5));
        (HttpServer::new(client, &HttpConfig::default()), shutdown)
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    #[tokio::test]
    async fn test_track_record_and_aggregate() {
        let (server, _shutdown) = server();
        let router = server.router();

        let (status, body) = call(&router, "POST", "/groups/kitchen/devices/thermo1", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"group": "kitchen", "device": "thermo1"}));

        let (status, _) = call(&router, "PUT", "/groups/kitchen/devices/thermo2/reading", Some(json!({"value": 2.5}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&router, "GET", "/groups/kitchen/devices", None).await;
        assert_eq!(body["devices"], json!(["thermo1", "thermo2"]));

        let (status, body) = call(&router, "GET", "/groups/kitchen/readings?timeout_ms=500", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["readings"],
            json!({
                "thermo1": {"status": "unavailable"},
                "thermo2": {"status": "value", "value": 2.5},
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_entities_are_not_found() {
        let (server, _shutdown) = server();
        let router = server.router();

        let (status, _) = call(&router, "GET", "/groups/nowhere/readings", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, "GET", "/groups/nowhere/devices/ghost/reading", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&router, "GET", "/groups/nowhere/devices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["devices"], json!([]));

        let (_, body) = call(&router, "GET", "/groups", None).await;
        assert_eq!(body["groups"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_timeout_rejected() {
        let (server, _shutdown) = server();
        let router = server.router();

        let (status, _) = call(&router, "GET", "/groups/kitchen/readings?timeout_ms=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

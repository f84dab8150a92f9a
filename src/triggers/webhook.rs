// src/triggers/webhook.rs — Inbound HTTP trigger (axum)
//
// One listener per trigger instance. A POST to the configured path emits
// the decoded JSON body as the event payload; delivery runs before the
// response is sent.

use anyhow::Context;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::{Event, EventSink, Payload};
use crate::triggers::Trigger;

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
struct WebhookParams {
    /// URL path to accept POSTs on (must start with '/')
    path: String,
    #[serde(default = "default_port")]
    port: u16,
}

pub struct WebhookTrigger {
    path: String,
    port: u16,
}

impl WebhookTrigger {
    pub const KIND: &'static str = "webhook";

    pub fn from_params(params: Payload) -> anyhow::Result<Self> {
        let params: WebhookParams = serde_json::from_value(Value::Object(params))
            .context("webhook trigger parameters")?;
        anyhow::ensure!(
            params.path.starts_with('/'),
            "webhook path must start with '/': {}",
            params.path
        );
        Ok(Self {
            path: params.path,
            port: params.port,
        })
    }
}

#[derive(Clone)]
struct WebhookState {
    sink: EventSink,
}

async fn receive(State(state): State<WebhookState>, Json(body): Json<Value>) -> Json<Value> {
    let payload = match body {
        Value::Object(map) => map,
        // Keep the payload a map even for scalar/array bodies
        other => {
            let mut map = Payload::new();
            map.insert("body".into(), other);
            map
        }
    };

    state.sink.dispatch(&Event::new(WebhookTrigger::KIND, payload));
    Json(serde_json::json!({"status": "ok"}))
}

fn build_router(sink: EventSink, path: &str) -> Router {
    Router::new()
        .route(path, post(receive))
        .with_state(WebhookState { sink })
}

impl Trigger for WebhookTrigger {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn start(&self, sink: EventSink, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let path = self.path.clone();
        let port = self.port;

        tokio::spawn(async move {
            let router = build_router(sink, &path);
            let addr = format!("0.0.0.0:{port}");

            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("webhook trigger failed to bind {}: {}", addr, e);
                    return;
                }
            };

            tracing::info!("webhook trigger listening on http://{}{}", addr, path);

            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;

            if let Err(e) = served {
                tracing::error!("webhook trigger server error: {}", e);
            }
            tracing::info!("webhook trigger stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::testutil::recording_sink;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    #[test]
    fn test_from_params_validates_path() {
        let mut params = Payload::new();
        params.insert("path".into(), "no-slash".into());
        assert!(WebhookTrigger::from_params(params).is_err());

        let mut params = Payload::new();
        params.insert("path".into(), "/hooks/in".into());
        let trigger = WebhookTrigger::from_params(params).unwrap();
        assert_eq!(trigger.kind(), "webhook");
        assert_eq!(trigger.port, 5000);
    }

    fn post_json(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_dispatches_decoded_body() {
        let (sink, recorder) = recording_sink();
        let app = build_router(sink, "/hooks/in");

        let resp = app
            .oneshot(post_json("/hooks/in", r#"{"ref": "main", "commits": 3}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let events = recorder.recorded();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trigger, "webhook");
        assert_eq!(events[0].payload["ref"], "main");
        assert_eq!(events[0].payload["commits"], 3);
    }

    #[tokio::test]
    async fn test_non_object_body_is_wrapped() {
        let (sink, recorder) = recording_sink();
        let app = build_router(sink, "/hooks/in");

        let resp = app.oneshot(post_json("/hooks/in", "[1, 2]")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let events = recorder.recorded();
        assert_eq!(events[0].payload["body"], serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_wrong_path_is_not_found() {
        let (sink, recorder) = recording_sink();
        let app = build_router(sink, "/hooks/in");

        let resp = app.oneshot(post_json("/other", "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(recorder.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_listener_binds_and_stops_on_shutdown() {
        let (sink, _recorder) = recording_sink();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // Port 0 lets the OS pick a free port; we only assert lifecycle.
        let trigger = WebhookTrigger {
            path: "/hook".into(),
            port: 0,
        };
        let handle = trigger.start(sink, shutdown_rx);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("webhook task should stop on shutdown")
            .unwrap();
    }
}

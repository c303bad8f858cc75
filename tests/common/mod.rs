//! Shared utilities for integration tests.

use std::fmt;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, TimeZone, Utc};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use response_facade::{FacadeConfig, HttpServer, MemoryHost, ResponseFacade};

/// Fixed instant used as the host clock.
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A façade over a fresh in-memory host with a pinned clock.
#[allow(dead_code)]
pub fn facade() -> ResponseFacade<MemoryHost> {
    facade_with(MemoryHost::new().with_clock(fixed_now()), FacadeConfig::default())
}

#[allow(dead_code)]
pub fn facade_with(host: MemoryHost, config: FacadeConfig) -> ResponseFacade<MemoryHost> {
    ResponseFacade::new(host, Arc::new(config))
}

/// Send a GET through the demo router without binding a socket.
#[allow(dead_code)]
pub async fn get(server: &HttpServer, uri: &str) -> Response<Body> {
    server
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as UTF-8.
#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Records the message of every WARN event.
#[allow(dead_code)]
#[derive(Clone, Default)]
struct WarningRecorder {
    messages: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for WarningRecorder {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.messages.lock().unwrap().push(visitor.0);
        }
    }
}

/// Run `f` under a subscriber that collects WARN messages.
#[allow(dead_code)]
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let recorder = WarningRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let output = tracing::subscriber::with_default(subscriber, f);
    let messages = recorder.messages.lock().unwrap().clone();
    (output, messages)
}

// ============================================================
// Layer 6 — Endpoint HTTP Server
// ============================================================
// Hosts a loaded predictor behind two routes:
//
//   GET  /ping         → 200 {"status":"healthy","endpoint":..}
//   POST /invocations  → decode → predict → encode
//
// Headers:
//   Content-Type  required, must be application/json
//   Accept        optional, absent or */* means application/json
//
// Errors come back as an ErrorResponse JSON body:
//   415 unsupported content type
//   406 unsupported accept type
//   400 malformed body or wrong JSON shape
//   500 prediction failure
//
// Predictions run on Tokio's blocking pool. Burn modules are
// Send but not Sync, so the model sits behind a Mutex.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::trace::TraceLayer;

use crate::application::handler::{self, InvocationError};
use crate::domain::errors::PayloadError;
use crate::domain::inference::ErrorResponse;
use crate::domain::traits::ActionPredictor;

/// A predictor shared between request handlers
pub type SharedPredictor = Arc<Mutex<Box<dyn ActionPredictor + Send>>>;

pub fn share(predictor: impl ActionPredictor + Send + 'static) -> SharedPredictor {
    Arc::new(Mutex::new(Box::new(predictor)))
}

#[derive(Clone)]
struct EndpointState {
    name:      Arc<str>,
    predictor: SharedPredictor,
}

/// Routes for one endpoint, without tracing layer.
pub fn router(name: &str, predictor: SharedPredictor) -> Router {
    let state = EndpointState { name: Arc::from(name), predictor };
    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .with_state(state)
}

async fn ping(State(state): State<EndpointState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "endpoint": &*state.name }))
}

async fn invocations(
    State(state): State<EndpointState>,
    headers:      HeaderMap,
    body:         Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let content_type = header_value(header::CONTENT_TYPE);
    let accept       = header_value(header::ACCEPT);

    let predictor = state.predictor.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let model = predictor
            .lock()
            .map_err(|_| InvocationError::Prediction(anyhow!("model lock poisoned")))?;
        handler::invoke(&**model, &body, &content_type, &accept)
    })
    .await;

    match outcome {
        Ok(Ok(invocation)) => {
            tracing::debug!("Endpoint '{}' answered {} predictions", state.name, invocation.count);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, invocation.content_type)],
                invocation.body,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            let (status, code) = classify(&e);
            tracing::warn!("Endpoint '{}' rejected request: {}", state.name, e);
            error_response(status, code, e.to_string())
        }
        Err(join_error) => {
            tracing::error!("Prediction task failed: {}", join_error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ModelError",
                format!("Prediction task failed: {join_error}"),
            )
        }
    }
}

fn classify(e: &InvocationError) -> (StatusCode, &'static str) {
    match e {
        InvocationError::Payload(p) => {
            let status = match p {
                PayloadError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                PayloadError::UnsupportedAcceptType(_)  => StatusCode::NOT_ACCEPTABLE,
                PayloadError::InvalidShape(_)
                | PayloadError::MalformedJson(_)        => StatusCode::BAD_REQUEST,
            };
            (status, p.error_code())
        }
        InvocationError::Prediction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ModelError"),
    }
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorResponse {
        error_code: code.to_string(),
        message,
        status:     status.as_u16(),
    };
    (status, Json(body)).into_response()
}

// ─── Running server ───────────────────────────────────────────────────────────

/// A listening endpoint. Dropping it without `shutdown` leaves the
/// task running until the runtime stops.
#[derive(Debug)]
pub struct EndpointServer {
    pub name: String,
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task:     JoinHandle<Result<()>>,
}

impl EndpointServer {
    /// Bind `bind` (e.g. "127.0.0.1:8080", port 0 for any) and start serving.
    pub async fn start(bind: &str, name: &str, predictor: SharedPredictor) -> Result<Self> {
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("Cannot bind endpoint '{}' to {}", name, bind))?;
        let addr = listener.local_addr()?;

        let app = router(name, predictor).layer(TraceLayer::new_for_http());
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
                .context("Endpoint server failed")
        });

        tracing::info!("Endpoint '{}' listening on http://{}", name, addr);
        Ok(Self { name: name.to_string(), addr, shutdown, task })
    }

    /// Base URL clients should use; wildcard binds map to loopback.
    pub fn url(&self) -> String {
        if self.addr.ip().is_unspecified() {
            format!("http://127.0.0.1:{}", self.addr.port())
        } else {
            format!("http://{}", self.addr)
        }
    }

    /// Stop accepting requests and wait for in-flight ones.
    pub async fn shutdown(self) -> Result<()> {
        let Self { name, shutdown, task, .. } = self;
        let _ = shutdown.send(());
        task.await.context("Endpoint task panicked")??;
        tracing::info!("Endpoint '{}' stopped", name);
        Ok(())
    }
}

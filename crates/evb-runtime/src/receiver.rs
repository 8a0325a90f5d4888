use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::EventWriter;

/// HTTP receiver that accepts newline-delimited JSON event bodies on a
/// single POST route and hands each body to the batch writer.
pub struct Receiver {
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
}

#[derive(Clone)]
struct IngestState {
    writer: Arc<EventWriter>,
}

/// Build the ingest router: `POST {path}` feeds the writer, any other method
/// on `{path}` is answered with 405. Bodies above `max_body_bytes` are
/// rejected before they reach the writer.
pub fn ingest_router(path: &str, writer: Arc<EventWriter>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(path, post(ingest_handler).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(IngestState { writer })
}

impl Receiver {
    /// Parse `"tcp://host:port"` (or a bare `host:port`) and bind a TCP listener.
    pub async fn bind(listen: &str, router: Router) -> anyhow::Result<Self> {
        let addr = listen.strip_prefix("tcp://").unwrap_or(listen);
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            router,
            cancel: CancellationToken::new(),
        })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a clone of the cancellation token for external shutdown signaling.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Serve until the cancellation token is triggered. In-flight requests
    /// are allowed to finish before this returns.
    #[tracing::instrument(name = "receiver", skip_all)]
    pub async fn run(self) -> anyhow::Result<()> {
        let cancel = self.cancel;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;
        evb_debug!(conn, "receiver stopped");
        Ok(())
    }
}

async fn ingest_handler(State(state): State<IngestState>, body: Bytes) -> Response {
    evb_trace!(pipe, bytes = body.len(), "request body received");
    let writer = Arc::clone(&state.writer);
    let outcome = tokio::task::spawn_blocking(move || writer.handle_request_body(&body)).await;
    match outcome {
        Ok(Ok(summary)) => {
            evb_debug!(pipe, events = summary.events, "request handled");
            (StatusCode::OK, "OK").into_response()
        }
        Ok(Err(e)) => {
            evb_warn!(pipe, error = %e, "error handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error handling request: {e}"),
            )
                .into_response()
        }
        Err(e) => {
            evb_error!(pipe, error = %e, "request worker panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error handling request: {e}"),
            )
                .into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Invalid request method").into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

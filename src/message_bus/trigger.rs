//! Inbound trigger listener
//!
//! HTTP surface through which callers (and the trigger script running in
//! their pages) reach the queue and the result bus.
//!
//! | route | body | answer |
//! |---|---|---|
//! | `POST /api/v1/scrape` | `StartScrape` | `Ack` |
//! | `POST /api/v1/messages` | tagged `Message` | `Ack` or delivery count |
//! | `GET /api/v1/health` | | queue and bus state |
//! | `GET /api/v1/trigger.js` | | page trigger script |

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::{Ack, Message, MessageBus, StartScrape};
use crate::instrumentation::trigger_script;
use crate::queue::{DrainState, JobQueue, JobRunner, RateSink};

/// Shared state of the listener's handlers
pub struct TriggerState<R, S> {
    queue: JobQueue<R, S>,
    bus: MessageBus,
    trigger_js: Arc<String>,
}

impl<R, S> Clone for TriggerState<R, S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            bus: self.bus.clone(),
            trigger_js: Arc::clone(&self.trigger_js),
        }
    }
}

/// Origins allowed to call the listener (empty allows all)
#[derive(Clone, Debug, Default)]
pub struct OriginGuard {
    allowed: Arc<Vec<String>>,
}

impl OriginGuard {
    #[must_use]
    pub fn new(allowed: Vec<String>) -> Self {
        let allowed = allowed
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_ascii_lowercase())
            .filter(|o| !o.is_empty())
            .collect();
        Self {
            allowed: Arc::new(allowed),
        }
    }

    /// Requests without an `Origin` header come from outside a browser and
    /// are let through.
    #[must_use]
    pub fn permits(&self, origin: Option<&str>) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        match origin {
            None => true,
            Some(origin) => {
                let origin = origin.trim().trim_end_matches('/').to_ascii_lowercase();
                self.allowed.iter().any(|allowed| *allowed == origin)
            }
        }
    }
}

async fn origin_middleware(
    State(guard): State<OriginGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok());

    if guard.permits(origin) {
        return next.run(request).await;
    }

    warn!("Rejected request from origin {}", origin.unwrap_or_default());
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "ORIGIN_NOT_ALLOWED" })),
    )
        .into_response()
}

async fn start_scrape<R: JobRunner, S: RateSink>(
    State(state): State<TriggerState<R, S>>,
    Json(request): Json<StartScrape>,
) -> Json<Ack> {
    debug!("START_SCRAPE with {} job(s)", request.jobs.len());
    Json(state.queue.start_scrape(request))
}

async fn messages<R: JobRunner, S: RateSink>(
    State(state): State<TriggerState<R, S>>,
    Json(message): Json<Message>,
) -> Response {
    match message {
        Message::StartScrape(request) => Json(state.queue.start_scrape(request)).into_response(),
        Message::ScrapeResult(result) => {
            let context_id = result.context_id.clone();
            match state.bus.publish(result) {
                Ok(delivered) => {
                    Json(json!({ "status": "DELIVERED", "delivered": delivered })).into_response()
                }
                Err(e) => {
                    debug!("SCRAPE_RESULT for {context_id} not delivered: {e}");
                    (
                        StatusCode::ACCEPTED,
                        Json(json!({ "status": "DROPPED", "delivered": 0 })),
                    )
                        .into_response()
                }
            }
        }
    }
}

async fn health<R: JobRunner, S: RateSink>(State(state): State<TriggerState<R, S>>) -> Response {
    let queue = state.queue.snapshot();
    Json(json!({
        "status": "ok",
        "pending": queue.pending,
        "draining": queue.state == DrainState::Draining,
        "has_token": queue.has_token,
        "bus": state.bus.metrics().snapshot(),
    }))
    .into_response()
}

async fn trigger_js<R: JobRunner, S: RateSink>(
    State(state): State<TriggerState<R, S>>,
) -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        state.trigger_js.as_str().to_owned(),
    )
        .into_response()
}

/// HTTP listener in front of the queue and the result bus
pub struct TriggerServer<R, S> {
    state: TriggerState<R, S>,
    guard: OriginGuard,
}

impl<R: JobRunner, S: RateSink> TriggerServer<R, S> {
    /// `public_base` is the address pages use to reach the listener, e.g.
    /// `http://127.0.0.1:8765`
    #[must_use]
    pub fn new(
        queue: JobQueue<R, S>,
        bus: MessageBus,
        allowed_origins: Vec<String>,
        public_base: &str,
    ) -> Self {
        let endpoint = format!("{}/api/v1/messages", public_base.trim_end_matches('/'));
        Self {
            state: TriggerState {
                queue,
                bus,
                trigger_js: Arc::new(trigger_script(&endpoint)),
            },
            guard: OriginGuard::new(allowed_origins),
        }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        let api_v1 = Router::new()
            .route("/scrape", post(start_scrape::<R, S>))
            .route("/messages", post(messages::<R, S>))
            .route("/health", get(health::<R, S>))
            .route("/trigger.js", get(trigger_js::<R, S>))
            .route_layer(middleware::from_fn_with_state(
                self.guard.clone(),
                origin_middleware,
            ))
            .with_state(self.state.clone());

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(Any);

        Router::new()
            .nest("/api/v1", api_v1)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn run<F>(self, addr: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind trigger listener on {addr}"))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().context("Listener has no address")?;
        info!("Trigger listener on http://{local}/api/v1");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Trigger listener shutting down");
            })
            .await
            .context("Trigger listener error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_guard() {
        let open = OriginGuard::new(Vec::new());
        assert!(open.permits(Some("https://anything.example")));

        let guard = OriginGuard::new(vec!["https://app.example.com/".to_string()]);
        assert!(guard.permits(Some("https://APP.example.com")));
        assert!(guard.permits(None));
        assert!(!guard.permits(Some("https://evil.example")));
    }
}

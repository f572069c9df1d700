//! HTTP session server for a map front end.
//!
//! One task owns the [`AppState`] and applies events strictly one at a time;
//! every applied event publishes a fresh snapshot on a watch channel. HTTP
//! handlers only send events and read snapshots, so a reader never sees a
//! half-updated state.
//!
//! Fetches run as independent tasks and report back through the same event
//! queue. They are never cancelled, and results land in completion order.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::app::{AppEvent, AppState, Effect};
use crate::client::{FeedRange, FeedSource, UsgsClient};
use crate::filters::EventFilter;
use crate::marks::Mark;
use crate::selection::{DisplayMode, Pick};
use crate::viewport::ViewState;

/// Queue depth between handlers and the session task.
const EVENT_QUEUE: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub range: FeedRange,
    pub filter: EventFilter,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            range: FeedRange::Day,
            filter: EventFilter::default(),
        }
    }
}

/// An event plus, for handler-originated events, where to send the result.
struct Envelope {
    event: AppEvent,
    reply: Option<oneshot::Sender<(AppState, Effect)>>,
}

/// Cheap handle to a running session.
#[derive(Clone)]
pub struct Session {
    tx: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<AppState>,
}

impl Session {
    /// Start a session task that loads `range` from `source` right away.
    pub fn spawn<S: FeedSource>(source: Arc<S>, range: FeedRange, filter: EventFilter) -> Self {
        let (state, effect) = AppState::start(range, filter);
        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let (snap_tx, snapshots) = watch::channel(state.clone());

        // Fetch tasks only hold weak senders so the loop ends with the last handle
        let loop_tx = tx.downgrade();
        tokio::spawn(async move {
            run_effect(&source, &loop_tx, effect);
            run_session(source, state, loop_tx, rx, snap_tx).await;
        });

        Self { tx, snapshots }
    }

    /// Latest published state.
    #[must_use]
    pub fn current(&self) -> AppState {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshots.clone()
    }

    /// Apply `event` and return the state right after it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the session task has stopped.
    pub async fn dispatch(&self, event: AppEvent) -> Result<AppState, AppError> {
        self.dispatch_with_effect(event).await.map(|(state, _)| state)
    }

    /// Apply `event` and return the state right after it, plus the effect
    /// the transition asked for.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the session task has stopped.
    pub async fn dispatch_with_effect(
        &self,
        event: AppEvent,
    ) -> Result<(AppState, Effect), AppError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| AppError::Unavailable)?;
        rx.await.map_err(|_| AppError::Unavailable)
    }
}

async fn run_session<S: FeedSource>(
    source: Arc<S>,
    mut state: AppState,
    tx: mpsc::WeakSender<Envelope>,
    mut rx: mpsc::Receiver<Envelope>,
    snapshots: watch::Sender<AppState>,
) {
    while let Some(Envelope { event, reply }) = rx.recv().await {
        let (next, effect) = state.apply(event);
        state = next;
        snapshots.send_replace(state.clone());
        if let Some(reply) = reply {
            // The handler may have gone away; the state is published regardless
            let _ = reply.send((state.clone(), effect));
        }
        run_effect(&source, &tx, effect);
    }
    debug!("session task stopped");
}

fn run_effect<S: FeedSource>(source: &Arc<S>, tx: &mpsc::WeakSender<Envelope>, effect: Effect) {
    let Effect::Fetch { request, range } = effect else {
        return;
    };
    let source = Arc::clone(source);
    let tx = tx.clone();
    tokio::spawn(async move {
        debug!("load #{request} ({}) started", range.as_str());
        let result = source.fetch(range).await;
        let event = AppEvent::LoadCompleted {
            request,
            range,
            result,
        };
        match tx.upgrade() {
            Some(tx) => {
                let _ = tx.send(Envelope { event, reply: None }).await;
            }
            None => debug!("load #{request} finished after the session closed"),
        }
    });
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request body or parameters
    BadRequest(String),
    /// A manual refresh arrived while a load was running
    LoadInProgress,
    /// The session task is gone
    Unavailable,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            Self::LoadInProgress => (
                StatusCode::CONFLICT,
                "LOAD_IN_PROGRESS",
                "a load is already in progress".to_string(),
            ),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SESSION_UNAVAILABLE",
                "session is not running".to_string(),
            ),
        };
        let body = ApiError {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON request body whose rejections come back as [`ApiError`] bodies.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
struct JsonBody<T>(T);

type ApiResult = Result<Response, AppError>;

fn snapshot_response(state: &AppState) -> Response {
    Json(state.snapshot()).into_response()
}

/// Create the Axum router with all routes.
pub fn create_router(session: Session) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stream", get(sse_handler))
        .route("/api/state", get(state_handler))
        .route("/api/marks", get(marks_handler))
        .route("/api/range", post(range_handler))
        .route("/api/filter", post(filter_handler))
        .route("/api/mode", post(mode_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/click", post(click_handler))
        .route("/api/hover", post(hover_handler))
        .route("/api/focus", post(focus_handler))
        .route("/api/view-state", post(view_state_handler))
        .route("/api/transition-end", post(transition_end_handler))
        .with_state(session)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the listener
/// cannot bind.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = Arc::new(UsgsClient::new()?);
    let session = Session::spawn(client, config.range, config.filter);
    let app = create_router(session);

    let addr = format!("{}:{}", config.host, config.port);
    info!("quakescope session server starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn state_handler(State(session): State<Session>) -> Response {
    snapshot_response(&session.current())
}

#[derive(Serialize)]
struct MarksBody<'a> {
    mode: DisplayMode,
    marks: Vec<Mark<'a>>,
}

/// Active records with their styling, for the renderer.
async fn marks_handler(State(session): State<Session>) -> Response {
    let state = session.current();
    let body = MarksBody {
        mode: state.mode(),
        marks: state.active().iter().map(Mark::from).collect(),
    };
    Json(body).into_response()
}

#[derive(Deserialize)]
struct RangeRequest {
    range: FeedRange,
}

async fn range_handler(
    State(session): State<Session>,
    JsonBody(req): JsonBody<RangeRequest>,
) -> ApiResult {
    let state = session.dispatch(AppEvent::RangeChanged(req.range)).await?;
    Ok((StatusCode::ACCEPTED, snapshot_response(&state)).into_response())
}

async fn filter_handler(
    State(session): State<Session>,
    JsonBody(filter): JsonBody<EventFilter>,
) -> ApiResult {
    if filter.min_depth > filter.max_depth {
        return Err(AppError::BadRequest(format!(
            "minDepth {} exceeds maxDepth {}",
            filter.min_depth, filter.max_depth
        )));
    }
    let state = session.dispatch(AppEvent::FilterChanged(filter)).await?;
    Ok(snapshot_response(&state))
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: DisplayMode,
}

async fn mode_handler(
    State(session): State<Session>,
    JsonBody(req): JsonBody<ModeRequest>,
) -> ApiResult {
    let state = session.dispatch(AppEvent::ModeChanged(req.mode)).await?;
    Ok(snapshot_response(&state))
}

async fn refresh_handler(State(session): State<Session>) -> ApiResult {
    let (state, effect) = session
        .dispatch_with_effect(AppEvent::RefreshRequested)
        .await?;
    if effect == Effect::None {
        return Err(AppError::LoadInProgress);
    }
    Ok((StatusCode::ACCEPTED, snapshot_response(&state)).into_response())
}

/// What the renderer reports for a click or hover.
#[derive(Deserialize)]
struct PointerRequest {
    #[serde(default)]
    object: Option<Value>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

async fn click_handler(
    State(session): State<Session>,
    JsonBody(req): JsonBody<PointerRequest>,
) -> ApiResult {
    let pick = Pick::from_renderer(session.current().mode(), req.object);
    let state = session.dispatch(AppEvent::MarkClicked(pick)).await?;
    Ok(snapshot_response(&state))
}

async fn hover_handler(
    State(session): State<Session>,
    JsonBody(req): JsonBody<PointerRequest>,
) -> ApiResult {
    let pick = Pick::from_renderer(session.current().mode(), req.object);
    let event = AppEvent::MarkHovered {
        pick,
        x: req.x,
        y: req.y,
    };
    let state = session.dispatch(event).await?;
    Ok(snapshot_response(&state))
}

#[derive(Deserialize)]
struct FocusRequest {
    region: String,
}

async fn focus_handler(
    State(session): State<Session>,
    JsonBody(req): JsonBody<FocusRequest>,
) -> ApiResult {
    let state = session.dispatch(AppEvent::FocusRegion(req.region)).await?;
    Ok(Json(state.view()).into_response())
}

async fn view_state_handler(
    State(session): State<Session>,
    JsonBody(view): JsonBody<ViewState>,
) -> ApiResult {
    session.dispatch(AppEvent::ViewStateChanged(view)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn transition_end_handler(State(session): State<Session>) -> ApiResult {
    session.dispatch(AppEvent::TransitionFinished).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// SSE: one `state` event per published snapshot.
async fn sse_handler(
    State(session): State<Session>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(session.subscribe()).map(|state| {
        let data = serde_json::to_string(&state.snapshot()).unwrap_or_default();
        Ok(Event::default().event("state").data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

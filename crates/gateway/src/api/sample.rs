//! Sample endpoints.
//!
//! - `GET      /sample/helloworld`: greeting as plain text
//! - `GET      /sample/msg`:        greeting as `{"message": ...}`
//! - `GET|POST /sample/session`:    write-once session attribute, echoes `msg`
//! - `POST     /sample/upload`:     counts the raw request body
//! - `GET      /sample/sleepy`:     responds after a fixed delay

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Extension, Form, Query, State};
use axum::response::Json;
use serde::Deserialize;

use hs_domain::trace::TraceEvent;
use hs_domain::{Error, Message, GREETING};
use hs_sessions::AttributeWrite;

use super::session_ctx::SessionContext;
use crate::error::ApiError;
use crate::state::AppState;
use crate::upload;

/// Session attribute written by the session endpoint.
pub const SESSION_KEY: &str = "aaa";

/// How long `/sample/sleepy` waits before answering.
pub const SLEEP: Duration = Duration::from_millis(500);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /sample/helloworld, GET /sample/msg
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn helloworld() -> &'static str {
    GREETING
}

pub async fn msg() -> Json<Message> {
    Json(Message::greeting())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET|POST /sample/session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default, Deserialize)]
pub struct MsgParams {
    #[serde(default)]
    pub msg: Option<String>,
}

/// Store `msg` in the caller's session the first time, log the stored
/// value on every later call, and always echo the *current* `msg`.
///
/// `msg` is read from the query string, or from a form-encoded body.
pub async fn session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<MsgParams>,
    form: Option<Form<MsgParams>>,
) -> Result<Json<Message>, ApiError> {
    let msg = query
        .msg
        .or_else(|| form.and_then(|Form(p)| p.msg))
        .ok_or_else(|| Error::MissingParameter("msg".into()))?;

    let session_id = ctx.session_id_or_create();

    match state.sessions.set_attribute_if_absent(&session_id, SESSION_KEY, &msg) {
        Some(AttributeWrite::Stored) => TraceEvent::SessionAttributeSet {
            session_id,
            key: SESSION_KEY.into(),
            value: msg.clone(),
        }
        .emit(),
        Some(AttributeWrite::Existing(old)) => TraceEvent::SessionAttributeExisting {
            session_id,
            key: SESSION_KEY.into(),
            value: old,
            from_cookie: ctx.requested_from_cookie(),
            from_url: ctx.requested_from_url(),
            valid: ctx.requested_valid(),
        }
        .emit(),
        None => {
            return Err(Error::Other(format!("session {session_id} expired mid-request")).into());
        }
    }

    Ok(Json(Message::new(format!("{GREETING}. msg={msg}"))))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /sample/upload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn upload(body: Body) -> Result<String, ApiError> {
    let started = Instant::now();
    let summary = upload::count_bytes(body.into_data_stream()).await?;

    TraceEvent::UploadCompleted {
        bytes: summary.bytes,
        chunks: summary.chunks,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
    .emit();

    Ok(summary.report())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /sample/sleepy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wait [`SLEEP`] before answering.  Server shutdown interrupts the wait
/// and fails the request instead of answering early.
pub async fn sleepy(State(state): State<AppState>) -> Result<String, ApiError> {
    tokio::select! {
        biased;
        _ = state.shutdown.cancelled() => {
            Err(Error::Interrupted("server shutting down".into()).into())
        }
        _ = tokio::time::sleep(SLEEP) => {
            Ok(format!("Yawn! I slept for {}ms", SLEEP.as_millis()))
        }
    }
}

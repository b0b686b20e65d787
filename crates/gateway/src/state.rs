use std::sync::Arc;

use hs_domain::config::Config;
use hs_sessions::{SessionIdTransport, SessionStore};
use tokio_util::sync::CancellationToken;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Sessions ──────────────────────────────────────────────────────
    pub sessions: Arc<SessionStore>,
    /// Cookie / URL parameter names carrying the session id.
    pub session_transport: Arc<SessionIdTransport>,

    // ── Lifecycle ─────────────────────────────────────────────────────
    /// Cancelled once the server begins shutting down.
    pub shutdown: CancellationToken,
}

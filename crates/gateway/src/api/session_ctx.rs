//! Per-request session context.
//!
//! The middleware resolves the session id the client presented (cookie
//! first, then URL token), refreshes it if it is still live, and hands the
//! handler a [`SessionContext`].  Sessions are created lazily: only a
//! handler calling [`SessionContext::session_id_or_create`] mints one, and
//! in that case the response carries a `Set-Cookie` for the new id.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;

use hs_sessions::{RequestedSessionId, SessionStore};

use crate::state::AppState;

/// Handle to the caller's session, inserted into request extensions.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<SessionStore>,
    requested: Option<RequestedSessionId>,
    requested_valid: bool,
    current: Mutex<Current>,
}

#[derive(Default)]
struct Current {
    id: Option<String>,
    created: bool,
}

impl SessionContext {
    pub fn new(
        store: Arc<SessionStore>,
        requested: Option<RequestedSessionId>,
        requested_valid: bool,
    ) -> Self {
        let current = Current {
            id: requested
                .as_ref()
                .filter(|_| requested_valid)
                .map(|r| r.id.clone()),
            created: false,
        };
        Self {
            inner: Arc::new(Inner {
                store,
                requested,
                requested_valid,
                current: Mutex::new(current),
            }),
        }
    }

    /// The id of the session bound to this request, creating one if the
    /// client presented none or presented one that is no longer live.
    pub fn session_id_or_create(&self) -> String {
        let mut current = self.inner.current.lock();
        if let Some(id) = &current.id {
            return id.clone();
        }
        let entry = self.inner.store.create();
        tracing::debug!(session_id = %entry.session_id, "session created");
        current.id = Some(entry.session_id.clone());
        current.created = true;
        entry.session_id
    }

    pub fn requested_from_cookie(&self) -> bool {
        self.inner.requested.as_ref().is_some_and(|r| r.from_cookie())
    }

    pub fn requested_from_url(&self) -> bool {
        self.inner.requested.as_ref().is_some_and(|r| r.from_url())
    }

    /// Whether the presented id named a live session when the request arrived.
    pub fn requested_valid(&self) -> bool {
        self.inner.requested_valid
    }

    fn created_id(&self) -> Option<String> {
        let current = self.inner.current.lock();
        current.created.then(|| current.id.clone()).flatten()
    }
}

/// Axum middleware that attaches a [`SessionContext`] to every request.
/// Attach via `axum::middleware::from_fn_with_state`.
pub async fn session_layer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let requested = {
        let cookies = req
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        state.session_transport.resolve(cookies, req.uri().query())
    };
    let requested_valid = requested
        .as_ref()
        .is_some_and(|r| state.sessions.touch(&r.id));

    let ctx = SessionContext::new(state.sessions.clone(), requested, requested_valid);
    req.extensions_mut().insert(ctx.clone());

    let mut resp = next.run(req).await;

    if let Some(id) = ctx.created_id() {
        match HeaderValue::from_str(&state.session_transport.set_cookie(&id)) {
            Ok(value) => {
                resp.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "session cookie not representable as a header"),
        }
    }

    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_sessions::SessionIdSource;

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(std::time::Duration::from_secs(60)))
    }

    #[test]
    fn creates_lazily_once() {
        let store = store();
        let ctx = SessionContext::new(store.clone(), None, false);
        assert!(ctx.created_id().is_none());
        assert!(store.is_empty());

        let first = ctx.session_id_or_create();
        let second = ctx.session_id_or_create();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(ctx.created_id(), Some(first));
    }

    #[test]
    fn reuses_valid_requested_session() {
        let store = store();
        let id = store.create().session_id;
        let requested = RequestedSessionId {
            id: id.clone(),
            source: SessionIdSource::Cookie,
        };
        let ctx = SessionContext::new(store.clone(), Some(requested), true);

        assert_eq!(ctx.session_id_or_create(), id);
        assert!(ctx.created_id().is_none());
        assert!(ctx.requested_from_cookie());
        assert!(!ctx.requested_from_url());
        assert!(ctx.requested_valid());
    }

    #[test]
    fn stale_requested_session_gets_replaced() {
        let store = store();
        let requested = RequestedSessionId {
            id: "gone".into(),
            source: SessionIdSource::Url,
        };
        let ctx = SessionContext::new(store, Some(requested), false);

        let id = ctx.session_id_or_create();
        assert_ne!(id, "gone");
        assert!(ctx.requested_from_url());
        assert!(!ctx.requested_valid());
        assert_eq!(ctx.created_id(), Some(id));
    }
}

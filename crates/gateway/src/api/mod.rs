pub mod health;
pub mod sample;
pub mod session_ctx;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// The `/sample` routes run behind the session middleware so handlers can
/// reach the caller's session through a [`session_ctx::SessionContext`].
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health::health));

    let sample = Router::new()
        .route("/sample/helloworld", get(sample::helloworld))
        .route("/sample/msg", get(sample::msg))
        .route("/sample/session", get(sample::session).post(sample::session))
        .route("/sample/upload", post(sample::upload))
        .route("/sample/sleepy", get(sample::sleepy))
        .route_layer(middleware::from_fn_with_state(
            state,
            session_ctx::session_layer,
        ));

    public.merge(sample)
}

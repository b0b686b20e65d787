//! AppState construction and background-task spawning extracted from `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use hs_domain::config::{Config, ConfigSeverity};
use hs_sessions::{SessionIdTransport, SessionStore};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Validate config and return a fully-wired [`AppState`].
///
/// Configuration warnings are logged; any error-level issue aborts startup.
pub fn build_app_state(config: Arc<Config>, shutdown: CancellationToken) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("configuration has {error_count} error(s)");
    }

    // ── Sessions ─────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(
        config.sessions.max_inactive_secs,
    )));
    let session_transport = Arc::new(SessionIdTransport::from_config(&config.sessions));
    tracing::info!(
        cookie = %session_transport.cookie_name,
        url_param = %session_transport.url_param,
        max_inactive_secs = config.sessions.max_inactive_secs,
        "session store ready"
    );

    Ok(AppState {
        config,
        sessions,
        session_transport,
        shutdown,
    })
}

/// Spawn the periodic maintenance loops.  They stop when `state.shutdown`
/// is cancelled.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic expired-session sweep ───────────────────────────────
    {
        let sessions = state.sessions.clone();
        let shutdown = state.shutdown.clone();
        let period = Duration::from_secs(state.config.sessions.prune_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let pruned = sessions.prune_expired();
                        if pruned > 0 {
                            tracing::debug!(pruned, remaining = sessions.len(), "expired sessions pruned");
                        }
                    }
                }
            }
        });
    }
}

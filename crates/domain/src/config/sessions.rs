use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How session ids travel between client and server, and how long an idle
/// session survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Name of the cookie carrying the session id.
    #[serde(default = "d_cookie_name")]
    pub cookie_name: String,

    /// Query parameter carrying the session id when cookies are not used.
    #[serde(default = "d_url_param")]
    pub url_param: String,

    /// Idle time after which a session is no longer valid.
    #[serde(default = "d_max_inactive_secs")]
    pub max_inactive_secs: u64,

    /// How often expired sessions are swept from memory.
    #[serde(default = "d_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            cookie_name: d_cookie_name(),
            url_param: d_url_param(),
            max_inactive_secs: d_max_inactive_secs(),
            prune_interval_secs: d_prune_interval_secs(),
        }
    }
}

fn d_cookie_name() -> String {
    "SESSIONID".into()
}
fn d_url_param() -> String {
    "sessionid".into()
}
fn d_max_inactive_secs() -> u64 {
    30 * 60
}
fn d_prune_interval_secs() -> u64 {
    60
}

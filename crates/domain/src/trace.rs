use serde::Serialize;

/// Structured trace events emitted across all hellosvc crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionAttributeSet {
        session_id: String,
        key: String,
        value: String,
    },
    SessionAttributeExisting {
        session_id: String,
        key: String,
        value: String,
        from_cookie: bool,
        from_url: bool,
        valid: bool,
    },
    SessionExpired {
        session_id: String,
        idle_secs: i64,
    },
    UploadCompleted {
        bytes: u64,
        chunks: u64,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "hs_event");
    }
}

//! CORS policy from `[server.cors]`.
//!
//! Each configured origin is either exact (`https://app.example`) or a
//! scheme and host followed by `:*`, which admits any numeric port on that
//! host.  A lone `"*"` admits every origin without credentials.

use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use hs_domain::config::CorsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginRule {
    Exact(String),
    /// Everything up to and including the `:` before the port.
    AnyPort(String),
}

impl OriginRule {
    fn parse(origin: &str) -> Self {
        match origin.strip_suffix('*') {
            Some(prefix) if prefix.ends_with(':') => Self::AnyPort(prefix.to_owned()),
            _ => Self::Exact(origin.to_owned()),
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == origin,
            Self::AnyPort(prefix) => origin
                .strip_prefix(prefix.as_str())
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}

pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if cors.allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured with wildcard \"*\"; all origins allowed");
        return base.allow_origin(Any);
    }

    let rules: Vec<OriginRule> = cors.allowed_origins.iter().map(|o| OriginRule::parse(o)).collect();
    // Credentials so the session cookie travels on cross-origin calls.
    base.allow_origin(AllowOrigin::predicate(move |origin, _| {
        origin
            .to_str()
            .is_ok_and(|origin| rules.iter().any(|rule| rule.matches(origin)))
    }))
    .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[test]
    fn any_port_rule() {
        let rule = OriginRule::parse("http://localhost:*");
        assert_eq!(rule, OriginRule::AnyPort("http://localhost:".into()));
        assert!(rule.matches("http://localhost:3000"));
        assert!(!rule.matches("http://localhost:"));
        assert!(!rule.matches("http://localhost:30x0"));
        assert!(!rule.matches("http://localhost.evil:3000"));
    }

    #[test]
    fn exact_rule() {
        let rule = OriginRule::parse("https://app.example");
        assert!(rule.matches("https://app.example"));
        assert!(!rule.matches("https://app.example:8443"));
    }

    async fn allow_origin_for(cors: &CorsConfig, origin: &str) -> Option<String> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(cors));
        let resp = app
            .oneshot(
                Request::get("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn default_config_admits_local_origins_only() {
        let cors = CorsConfig::default();
        assert_eq!(
            allow_origin_for(&cors, "http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(allow_origin_for(&cors, "https://elsewhere.example").await, None);
    }

    #[tokio::test]
    async fn wildcard_admits_everything() {
        let cors = CorsConfig {
            allowed_origins: vec!["*".into()],
        };
        assert_eq!(
            allow_origin_for(&cors, "https://elsewhere.example").await.as_deref(),
            Some("*")
        );
    }
}

//! Resolution of the session id a client presented with a request.
//!
//! A cookie takes precedence over a URL token.  Whether the id still names
//! a live session is a separate question answered by the store.

use std::borrow::Cow;

use hs_domain::config::SessionsConfig;

/// Where a requested session id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIdSource {
    Cookie,
    Url,
}

/// The session id a client presented, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedSessionId {
    pub id: String,
    pub source: SessionIdSource,
}

impl RequestedSessionId {
    pub fn from_cookie(&self) -> bool {
        self.source == SessionIdSource::Cookie
    }

    pub fn from_url(&self) -> bool {
        self.source == SessionIdSource::Url
    }
}

/// Names under which the session id travels.
#[derive(Debug, Clone)]
pub struct SessionIdTransport {
    pub cookie_name: String,
    pub url_param: String,
}

impl SessionIdTransport {
    pub fn from_config(cfg: &SessionsConfig) -> Self {
        Self {
            cookie_name: cfg.cookie_name.clone(),
            url_param: cfg.url_param.clone(),
        }
    }

    /// Find the requested session id among the request's `Cookie` header
    /// values and its query string.
    pub fn resolve<'a, I>(&self, cookie_headers: I, query: Option<&str>) -> Option<RequestedSessionId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let from_cookie = cookie_headers
            .into_iter()
            .find_map(|h| cookie_value(h, &self.cookie_name));
        if let Some(id) = from_cookie {
            return Some(RequestedSessionId {
                id: id.to_owned(),
                source: SessionIdSource::Cookie,
            });
        }

        query
            .and_then(|q| query_value(q, &self.url_param))
            .map(|id| RequestedSessionId {
                id: id.into_owned(),
                source: SessionIdSource::Url,
            })
    }

    /// `Set-Cookie` value binding the client to `session_id`.
    pub fn set_cookie(&self, session_id: &str) -> String {
        format!("{}={session_id}; Path=/; HttpOnly", self.cookie_name)
    }
}

/// Value of cookie `name` in a `Cookie` header (`a=1; b=2`).  Empty values
/// are ignored.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        let v = v.trim().trim_matches('"');
        (k.trim() == name && !v.is_empty()).then_some(v)
    })
}

/// Percent-decoded value of parameter `name` in a raw query string
/// (`a=1&b=2`).  Values that do not decode to UTF-8 are skipped.
pub fn query_value<'a>(query: &'a str, name: &str) -> Option<Cow<'a, str>> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k != name || v.is_empty() {
            return None;
        }
        urlencoding::decode(v).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> SessionIdTransport {
        SessionIdTransport::from_config(&SessionsConfig::default())
    }

    #[test]
    fn cookie_value_finds_named_pair() {
        assert_eq!(cookie_value("a=1; SESSIONID=abc; b=2", "SESSIONID"), Some("abc"));
        assert_eq!(cookie_value("SESSIONID=\"abc\"", "SESSIONID"), Some("abc"));
        assert_eq!(cookie_value("XSESSIONID=abc", "SESSIONID"), None);
        assert_eq!(cookie_value("SESSIONID=", "SESSIONID"), None);
        assert_eq!(cookie_value("", "SESSIONID"), None);
    }

    #[test]
    fn query_value_finds_named_param() {
        assert_eq!(query_value("msg=x&sessionid=abc", "sessionid").as_deref(), Some("abc"));
        assert_eq!(query_value("sessionid", "sessionid"), None);
        assert_eq!(query_value("msg=x", "sessionid"), None);
    }

    #[test]
    fn query_value_percent_decodes() {
        assert_eq!(query_value("sessionid=a%2Db%2Dc", "sessionid").as_deref(), Some("a-b-c"));
        assert_eq!(query_value("sessionid=%FF", "sessionid"), None);

        let got = transport().resolve(std::iter::empty(), Some("sessionid=u%31")).unwrap();
        assert_eq!(got.id, "u1");
    }

    #[test]
    fn cookie_wins_over_url() {
        let got = transport()
            .resolve(["SESSIONID=c1"], Some("sessionid=u1"))
            .unwrap();
        assert_eq!(got.id, "c1");
        assert!(got.from_cookie());
        assert!(!got.from_url());
    }

    #[test]
    fn falls_back_to_url() {
        let got = transport()
            .resolve(["other=1"], Some("msg=hi&sessionid=u1"))
            .unwrap();
        assert_eq!(got.id, "u1");
        assert!(got.from_url());
    }

    #[test]
    fn searches_every_cookie_header() {
        let got = transport()
            .resolve(["a=1", "SESSIONID=second"], None)
            .unwrap();
        assert_eq!(got.id, "second");
    }

    #[test]
    fn nothing_presented() {
        assert!(transport().resolve(std::iter::empty(), None).is_none());
    }

    #[test]
    fn set_cookie_format() {
        assert_eq!(
            transport().set_cookie("abc"),
            "SESSIONID=abc; Path=/; HttpOnly"
        );
    }
}

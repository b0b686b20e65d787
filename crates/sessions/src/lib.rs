//! HTTP session management for hellosvc.
//!
//! An in-memory store keyed by opaque session id, with write-once attribute
//! semantics and idle expiry, plus resolution of the session id a client
//! presented (cookie or URL token).

pub mod requested;
pub mod store;

pub use requested::{RequestedSessionId, SessionIdSource, SessionIdTransport};
pub use store::{AttributeWrite, SessionEntry, SessionStore};

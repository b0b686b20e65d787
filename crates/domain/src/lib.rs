//! Shared types for hellosvc: the `Message` value, the error type,
//! structured trace events and the configuration model.

pub mod config;
pub mod error;
pub mod message;
pub mod trace;

pub use error::{Error, Result};
pub use message::{Message, GREETING};

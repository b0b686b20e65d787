use serde::Serialize;

/// Fixed greeting returned by the sample endpoints.
pub const GREETING: &str = "Hello, World!这是一条测试语句";

/// Immutable text payload returned as JSON (`{"message": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The greeting wrapped in a `Message`.
    pub fn greeting() -> Self {
        Self::new(GREETING)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Shared error type used across all hellosvc crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("interrupted: {0}")]
    Interrupted(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure was caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::MissingParameter(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_is_client_error() {
        let err = Error::MissingParameter("msg".into());
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "missing required parameter 'msg'");
    }

    #[test]
    fn io_is_server_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("IO: "));
    }
}

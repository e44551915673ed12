/// Domain errors for the Wanaku discovery client
#[derive(Debug, thiserror::Error)]
pub enum WanakuError {
    #[error("Configuration not found: {0}")]
    ConfigurationNotFound(String),

    #[error("Entity already exists: {0}")]
    EntityAlreadyExists(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Authentication failure: {0}")]
    AuthenticationFailure(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Invalid response data: {0}")]
    InvalidResponseData(String),

    #[error("Corrupt identity file {path}: {reason}")]
    CorruptIdentityFile { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type WanakuResult<T> = Result<T, WanakuError>;

impl WanakuError {
    /// Maps a non-success registry status onto the error taxonomy.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => WanakuError::ServiceNotFound(body),
            409 => WanakuError::EntityAlreadyExists(body),
            503 => WanakuError::ServiceUnavailable(body),
            _ => WanakuError::UnexpectedStatus { status, body },
        }
    }

    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WanakuError::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_entity_already_exists() {
        let err = WanakuError::from_status(409, "duplicate");
        assert!(matches!(err, WanakuError::EntityAlreadyExists(ref b) if b == "duplicate"));
    }

    #[test]
    fn unknown_status_keeps_code() {
        let err = WanakuError::from_status(500, "boom");
        assert!(matches!(err, WanakuError::UnexpectedStatus { status: 500, .. }));
        assert_eq!(err.to_string(), "Unexpected status 500: boom");
    }

    #[test]
    fn other_keeps_the_source() {
        use std::error::Error as _;

        let err = WanakuError::other(std::fmt::Error);
        assert!(matches!(err, WanakuError::Other(_)));
        assert_eq!(err.to_string(), std::fmt::Error.to_string());
        assert!(err.source().is_some());
    }
}

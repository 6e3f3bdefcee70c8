/// Result type alias for kernel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the judgment and learning kernel
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Chain integrity error: {0}")]
    Integrity(String),

    #[error("Worker queue full, persistence skipped")]
    Overloaded,

    #[error("Judgment not found: {0}")]
    NotFound(String),

    #[error("Learning error: {0}")]
    Learning(String),

    #[error("Reset requires confirm phrase")]
    DangerousReset,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation timed out")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is recoverable (can retry with backoff)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Storage(_) => true,
            Error::Validation(_) => false,
            Error::Integrity(_) => false,
            Error::Overloaded => true,
            Error::NotFound(_) => false,
            Error::Learning(_) => false,
            Error::DangerousReset => false,
            Error::Serialization(_) => false,
            Error::Timeout => true,
            Error::Io(_) => true,
        }
    }

    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Error::Storage(_) => "storage",
            Error::Validation(_) => "validation",
            Error::Integrity(_) => "integrity",
            Error::Overloaded => "overloaded",
            Error::NotFound(_) => "not_found",
            Error::Learning(_) => "learning",
            Error::DangerousReset => "dangerous_reset",
            Error::Serialization(_) => "serialization",
            Error::Timeout => "timeout",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::Storage("conn refused".into()).is_recoverable());
        assert!(Error::Overloaded.is_recoverable());
        assert!(!Error::Validation("bad verdict".into()).is_recoverable());
        assert!(!Error::DangerousReset.is_recoverable());
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::Validation("x".into()).code(), "validation");
        assert_eq!(Error::Overloaded.code(), "overloaded");
    }
}

//! Suppression store error types.

/// Errors from reading or writing dismissal records.
#[derive(Debug, thiserror::Error)]
pub enum SuppressionError {
    /// Filesystem operation failed
    #[error("suppression store I/O error: {message}")]
    Io { message: String },

    /// Failed to serialize or parse the store file
    #[error("suppression store JSON error: {message}")]
    Json { message: String },

    /// Unknown alert category name
    #[error("unknown alert category: {0}")]
    UnknownCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SuppressionError::UnknownCategory("train".into());
        assert_eq!(err.to_string(), "unknown alert category: train");

        let err = SuppressionError::Io {
            message: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "suppression store I/O error: permission denied"
        );
    }
}

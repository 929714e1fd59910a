use std::time::Duration;

/// Stable classification of a failed reel job.
///
/// Every [`ReelError`] maps onto exactly one kind. The gateway uses the
/// kind to pick an HTTP status; callers use it to decide whether a retry
/// makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientPhotos,
    TooManyPhotos,
    InvalidTemplate,
    EngineUnavailable,
    RenderFailed,
    UploadFailed,
    Overloaded,
}

impl ErrorKind {
    /// `true` for failures caused by the request itself.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::InsufficientPhotos | Self::TooManyPhotos | Self::InvalidTemplate
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("At least {required} photos are required, got {count}")]
    InsufficientPhotos { count: usize, required: usize },

    #[error("At most {max} photos are accepted, got {count}")]
    TooManyPhotos { count: usize, max: usize },

    #[error("Invalid template '{given}'. Use one of: {valid}")]
    InvalidTemplate { given: String, valid: String },

    #[error("Render engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Render timed out after {}s", budget.as_secs())]
    RenderTimeout { budget: Duration },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Too many renders in progress ({capacity} running or queued), retry later")]
    Overloaded { capacity: usize },
}

impl ReelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientPhotos { .. } => ErrorKind::InsufficientPhotos,
            Self::TooManyPhotos { .. } => ErrorKind::TooManyPhotos,
            Self::InvalidTemplate { .. } => ErrorKind::InvalidTemplate,
            Self::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            Self::RenderFailed(_) | Self::RenderTimeout { .. } => ErrorKind::RenderFailed,
            Self::UploadFailed(_) => ErrorKind::UploadFailed,
            Self::Overloaded { .. } => ErrorKind::Overloaded,
        }
    }

    /// Machine-readable error code returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientPhotos { .. } => "INSUFFICIENT_PHOTOS",
            Self::TooManyPhotos { .. } => "TOO_MANY_PHOTOS",
            Self::InvalidTemplate { .. } => "INVALID_TEMPLATE",
            Self::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            Self::RenderFailed(_) => "RENDER_FAILED",
            Self::RenderTimeout { .. } => "RENDER_TIMEOUT",
            Self::UploadFailed(_) => "UPLOAD_FAILED",
            Self::Overloaded { .. } => "OVERLOADED",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RenderTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_a_render_failure() {
        let err = ReelError::RenderTimeout {
            budget: Duration::from_secs(300),
        };
        assert_eq!(err.kind(), ErrorKind::RenderFailed);
        assert_eq!(err.code(), "RENDER_TIMEOUT");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Render timed out after 300s");
    }

    #[test]
    fn validation_kinds_are_client_errors() {
        assert!(ErrorKind::InsufficientPhotos.is_client_error());
        assert!(ErrorKind::TooManyPhotos.is_client_error());
        assert!(ErrorKind::InvalidTemplate.is_client_error());
        assert!(!ErrorKind::RenderFailed.is_client_error());
        assert!(!ErrorKind::UploadFailed.is_client_error());
        assert!(!ErrorKind::EngineUnavailable.is_client_error());
        assert!(!ErrorKind::Overloaded.is_client_error());
    }

    #[test]
    fn insufficient_photos_message_names_counts() {
        let err = ReelError::InsufficientPhotos {
            count: 3,
            required: 5,
        };
        assert_eq!(err.to_string(), "At least 5 photos are required, got 3");
    }
}

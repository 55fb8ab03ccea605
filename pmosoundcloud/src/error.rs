//! Error handling for the SoundCloud source

use thiserror::Error;

/// Result type alias for pmosoundcloud
pub type Result<T> = std::result::Result<T, SoundCloudError>;

/// Errors raised by the SoundCloud catalog and playback paths
#[derive(Error, Debug)]
pub enum SoundCloudError {
    /// No response / connection failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body not parseable as the expected structure
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Server returned a structured error field
    #[error("SoundCloud API error (code {code}): {message}")]
    RemoteApi { code: u16, message: String },

    /// Authentication failed (invalid or expired credential)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found (track, playlist, user, etc.)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Quota exceeded (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Successful HTTP response lacking the expected relocation target
    #[error("Stream resolution failed: no relocation target for {0}")]
    RedirectMissing(String),

    /// Playable identifier did not embed a track id
    #[error("Invalid playable identifier: {0}")]
    InvalidUri(String),

    /// Settings layer error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SoundCloudError {
    /// Create an API error from an HTTP status code and a message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::RemoteApi {
                code,
                message: message.into(),
            },
        }
    }

    /// Stable key identifying the error kind, for host-side message lookup
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::RemoteApi { .. } => "remote_api",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::RateLimitExceeded => "rate_limit",
            Self::RedirectMissing(_) => "stream_resolution_failed",
            Self::InvalidUri(_) => "invalid_uri",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Whether the error indicates a credential problem (401/403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code_mapping() {
        assert!(matches!(
            SoundCloudError::from_status_code(401, "bad token"),
            SoundCloudError::Unauthorized(_)
        ));
        assert!(matches!(
            SoundCloudError::from_status_code(404, "gone"),
            SoundCloudError::NotFound(_)
        ));
        assert!(matches!(
            SoundCloudError::from_status_code(429, ""),
            SoundCloudError::RateLimitExceeded
        ));
        assert!(matches!(
            SoundCloudError::from_status_code(503, "down"),
            SoundCloudError::RemoteApi { code: 503, .. }
        ));
    }

    #[test]
    fn test_kind_is_stable() {
        let err = SoundCloudError::RedirectMissing("http://x".into());
        assert_eq!(err.kind(), "stream_resolution_failed");
        assert!(SoundCloudError::from_status_code(403, "no").is_auth_error());
    }
}

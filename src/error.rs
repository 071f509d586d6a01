//! Error types for the voice turn-taking controller.

/// Top-level error type for the voice session.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Microphone / speech-recognition permission denied. Fatal to
    /// starting the loop; never retried.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Speech recognition error from the capture provider.
    #[error("recognition error ({code}): {message}")]
    Recognition {
        /// Provider error code (e.g. "no-speech", "aborted", "network").
        code: String,
        message: String,
    },

    /// Conversational backend call failed (network/remote).
    #[error("backend error: {0}")]
    Backend(String),

    /// Audio playback failed or timed out.
    #[error("playback error: {0}")]
    Playback(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceError {
    /// Recognition error codes that are expected during normal operation
    /// and are silently retried rather than surfaced to the user.
    pub fn is_recoverable_recognition(&self) -> bool {
        match self {
            Self::Recognition { code, .. } => matches!(
                code.as_str(),
                "aborted" | "no-speech" | "timeout" | "interrupted" | "busy"
            ),
            _ => false,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_codes() {
        for code in ["aborted", "no-speech", "timeout", "interrupted", "busy"] {
            let e = VoiceError::Recognition {
                code: code.to_owned(),
                message: String::new(),
            };
            assert!(
                e.is_recoverable_recognition(),
                "{code} should be recoverable"
            );
        }
    }

    #[test]
    fn fatal_codes_are_not_recoverable() {
        let e = VoiceError::Recognition {
            code: "audio-capture".to_owned(),
            message: "device lost".to_owned(),
        };
        assert!(!e.is_recoverable_recognition());
        assert!(!VoiceError::Backend("down".to_owned()).is_recoverable_recognition());
    }
}

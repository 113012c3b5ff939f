use serde::{Deserialize, Serialize};

/// Result alias that carries the custom [`VideoWallError`] type.
pub type Result<T> = std::result::Result<T, VideoWallError>;

/// Common error type for the core crate.
///
/// Only the outer surface (configuration, catalog input, IO) is fallible in
/// this sense. Playback problems are [`PlaybackFault`] values that cards and
/// the analyzer recover from locally.
#[derive(Debug, thiserror::Error)]
pub enum VideoWallError {
    /// Free-form message for conditions that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A catalog could not be built from the provided entries.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VideoWallError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for VideoWallError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VideoWallError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

/// Locally recovered playback and feature faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PlaybackFault {
    /// No `loadeddata`/`canplay` arrived before the load timeout expired.
    #[error("clip did not become ready before the load timeout")]
    LoadTimeout,
    /// The media element reported a decode or playback error.
    #[error("clip failed to decode or play")]
    DecodeOrPlayback,
    /// Vibration or audio analysis is not available on this host.
    #[error("feature unavailable on this host")]
    FeatureUnavailable,
    /// The host refused to start playback without a user gesture.
    #[error("autoplay was rejected by the host")]
    AutoplayRejected,
}

impl PlaybackFault {
    /// Whether the fault moves a card into the errored state.
    pub fn is_fatal_for_card(self) -> bool {
        matches!(self, Self::LoadTimeout | Self::DecodeOrPlayback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_load_and_decode_faults_are_fatal() {
        assert!(PlaybackFault::LoadTimeout.is_fatal_for_card());
        assert!(PlaybackFault::DecodeOrPlayback.is_fatal_for_card());
        assert!(!PlaybackFault::AutoplayRejected.is_fatal_for_card());
        assert!(!PlaybackFault::FeatureUnavailable.is_fatal_for_card());
    }

    #[test]
    fn string_conversions_produce_messages() {
        let err: VideoWallError = "boom".into();
        assert_eq!(err.to_string(), "boom");
        let err = VideoWallError::InvalidConfig("fft".to_string());
        assert!(err.to_string().contains("fft"));
    }
}

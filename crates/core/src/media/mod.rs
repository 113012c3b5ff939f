//! The playback element surface the cards drive. The library never decodes
//! media itself; hosts implement [`MediaElement`] over whatever player they
//! have and forward its events.

use serde::{Deserialize, Serialize};

use crate::PlaybackFault;

/// Lifecycle and progress events emitted by a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEvent {
    LoadStart,
    LoadedData,
    CanPlay,
    Play,
    Pause,
    Ended,
    TimeUpdate,
    Error,
}

/// How much of the clip the element has buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Whether the current frame is decoded, the minimum for audio analysis.
    pub fn has_current_data(self) -> bool {
        self >= Self::HaveCurrentData
    }
}

/// Control surface of one playback element.
pub trait MediaElement {
    /// Points the element at `src` and starts fetching.
    fn load(&mut self, src: &str);

    /// Drops the source and any buffered data.
    fn unload(&mut self);

    /// Requests playback. Hosts that refuse to start without a user gesture
    /// return [`PlaybackFault::AutoplayRejected`].
    fn play(&mut self) -> Result<(), PlaybackFault>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn ready_state(&self) -> ReadyState;

    /// Clip length in seconds, once known.
    fn duration(&self) -> Option<f64>;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Events produced since the last call, for hosts that poll rather than
    /// push. Push-based hosts keep the default.
    fn drain_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}

/// Fraction of the clip already played, in [0, 1]. Unknown or zero-length
/// durations report zero.
pub fn progress_of(current_time: f64, duration: Option<f64>) -> f32 {
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => {
            (current_time / duration).clamp(0.0, 1.0) as f32
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_handles_unknown_duration() {
        assert_eq!(progress_of(3.0, None), 0.0);
        assert_eq!(progress_of(3.0, Some(0.0)), 0.0);
        assert_eq!(progress_of(3.0, Some(f64::NAN)), 0.0);
        assert_eq!(progress_of(3.0, Some(12.0)), 0.25);
        assert_eq!(progress_of(30.0, Some(12.0)), 1.0);
    }

    #[test]
    fn ready_state_ordering() {
        assert!(!ReadyState::HaveMetadata.has_current_data());
        assert!(ReadyState::HaveCurrentData.has_current_data());
        assert!(ReadyState::HaveEnoughData.has_current_data());
    }
}

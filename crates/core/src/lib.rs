//! Core library for the haptic video wall.
//!
//! A vertically scrolling feed of short clips where exactly one card is
//! active at a time. The active card plays, its successor is prefetched and
//! everything further away is released. While a clip plays, its audio is
//! sampled once per display frame and turned into vibration patterns.
//!
//! The crate is host-driven: it never reads wall-clock time or spawns
//! threads. A host (browser shell, native player or the [`sim`] module)
//! supplies media elements, a vibration motor and an audio analyzer through
//! the traits exported here, forwards input and time, and renders the
//! [`WallNotice`]s the wall queues.

pub mod analysis;
pub mod audio;
pub mod card;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod haptics;
pub mod input;
pub mod media;
pub mod sim;
pub mod timeline;
pub mod wall;

pub use analysis::{
    BandLevels, IntensityLevel, LoudnessAnalyzer, LoudnessReading, SpectrumAnalyser,
};
pub use audio::{AnalyzerBackend, AudioTap, FrequencyTap, NoAnalyzer, PcmSource, PcmTap, TapSlot};
pub use card::{CardContext, CardController, CardPhase, CardState, CardTimer};
pub use catalog::{Catalog, ClipEntry};
pub use config::{AnalyzerConfig, AppConfig, FeedConfig, HapticsConfig, PlaybackConfig};
pub use error::{PlaybackFault, Result, VideoWallError};
pub use feed::{residency, Direction, FeedCoordinator, Residency};
pub use haptics::{
    HapticEvent, Haptics, NullVibrator, PatternTable, Pulse, Vibrator, DEFAULT_PATTERN,
};
pub use input::{KeyCommand, KeySequence, SwipeTracker, CHEAT_CODE};
pub use media::{progress_of, MediaElement, MediaEvent, ReadyState};
pub use sim::{
    RecordingVibrator, Scenario, ScriptStep, SimReport, SimulatedMedia, Simulation,
    SyntheticAnalyzer,
};
pub use timeline::{AnimationLoop, HostClock, Scheduler, TimerId};
pub use wall::{UserAction, Wall, WallNotice};

//! Vibration patterns and the feedback bus that cards, the analyzer and the
//! feed use to actuate the device.
//!
//! Nothing here is global. A [`Haptics`] value is owned by the wall and lent
//! to whichever component needs to emit feedback during an event.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{HapticsConfig, PlaybackFault, VideoWallError};

/// Pattern used for names the table does not know.
pub const DEFAULT_PATTERN: &[u32] = &[50];

/// Symbolic vibration events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HapticEvent {
    Play,
    Pause,
    End,
    Error,
    Warning,
    CardActivate,
    CardSwitch,
    Next,
    Previous,
    Welcome,
    EasterEggOn,
    EasterEggOff,
    Drop,
    Intense,
    PowerPulse,
    BassHit,
    DrumBeat,
    Subtle,
    BuildUp,
    RhythmSync,
}

impl HapticEvent {
    pub const ALL: [HapticEvent; 20] = [
        Self::Play,
        Self::Pause,
        Self::End,
        Self::Error,
        Self::Warning,
        Self::CardActivate,
        Self::CardSwitch,
        Self::Next,
        Self::Previous,
        Self::Welcome,
        Self::EasterEggOn,
        Self::EasterEggOff,
        Self::Drop,
        Self::Intense,
        Self::PowerPulse,
        Self::BassHit,
        Self::DrumBeat,
        Self::Subtle,
        Self::BuildUp,
        Self::RhythmSync,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::End => "end",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::CardActivate => "cardActivate",
            Self::CardSwitch => "cardSwitch",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Welcome => "welcome",
            Self::EasterEggOn => "easterEggOn",
            Self::EasterEggOff => "easterEggOff",
            Self::Drop => "drop",
            Self::Intense => "intense",
            Self::PowerPulse => "powerPulse",
            Self::BassHit => "bassHit",
            Self::DrumBeat => "drumBeat",
            Self::Subtle => "subtle",
            Self::BuildUp => "buildUp",
            Self::RhythmSync => "rhythmSync",
        }
    }

    /// Per-event scaling applied on top of the configured intensity. Drops
    /// are amplified and ultra-high shimmer is attenuated.
    pub fn gain(self) -> f32 {
        match self {
            Self::Drop => 1.5,
            Self::Subtle => 0.5,
            _ => 1.0,
        }
    }
}

impl fmt::Display for HapticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HapticEvent {
    type Err = VideoWallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| VideoWallError::msg(format!("unknown haptic event `{s}`")))
    }
}

/// Symbolic name to on/off pulse sequence, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTable {
    patterns: HashMap<String, Vec<u32>>,
    min_pulse_ms: u32,
    max_pulse_ms: u32,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::with_bounds(10, 400)
    }
}

impl PatternTable {
    /// Builds the stock table with the given clamp range.
    pub fn with_bounds(min_pulse_ms: u32, max_pulse_ms: u32) -> Self {
        let patterns = HapticEvent::ALL
            .into_iter()
            .map(|event| (event.name().to_string(), stock_pattern(event).to_vec()))
            .collect();
        Self {
            patterns,
            min_pulse_ms,
            max_pulse_ms: max_pulse_ms.max(min_pulse_ms),
        }
    }

    /// Overrides or adds a named pattern.
    pub fn insert(&mut self, name: impl Into<String>, pattern: Vec<u32>) {
        self.patterns.insert(name.into(), pattern);
    }

    /// Raw pattern for a name, falling back to [`DEFAULT_PATTERN`].
    pub fn pattern(&self, name: &str) -> &[u32] {
        self.patterns
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(DEFAULT_PATTERN)
    }

    /// Scales every duration by `intensity` and clamps it into the safe range.
    pub fn resolve(&self, name: &str, intensity: f32) -> Vec<u32> {
        let scale = if intensity.is_finite() { intensity.max(0.0) } else { 1.0 };
        self.pattern(name)
            .iter()
            .map(|&ms| {
                let scaled = (ms as f32 * scale).round();
                (scaled as u32).clamp(self.min_pulse_ms, self.max_pulse_ms)
            })
            .collect()
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min_pulse_ms, self.max_pulse_ms)
    }

    /// Sorted `(name, pattern)` pairs, mainly for listing.
    pub fn entries(&self) -> Vec<(&str, &[u32])> {
        let mut entries: Vec<_> = self
            .patterns
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern.as_slice()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

fn stock_pattern(event: HapticEvent) -> &'static [u32] {
    match event {
        HapticEvent::Play => &[40],
        HapticEvent::Pause => &[30, 50, 30],
        HapticEvent::End => &[30],
        HapticEvent::Error => &[200, 100, 200],
        HapticEvent::Warning => &[60, 40, 60],
        HapticEvent::CardActivate => &[25],
        HapticEvent::CardSwitch => &[35],
        HapticEvent::Next => &[120, 40, 80],
        HapticEvent::Previous => &[80, 40, 120],
        HapticEvent::Welcome => &[100, 50, 150],
        HapticEvent::EasterEggOn => &[50, 30, 70, 30, 100, 30, 150, 30, 200],
        HapticEvent::EasterEggOff => &[200, 50, 150, 50, 100, 50, 70, 50, 50],
        HapticEvent::Drop => &[150, 50, 200],
        HapticEvent::Intense => &[80, 30, 80],
        HapticEvent::PowerPulse => &[120, 40, 160],
        HapticEvent::BassHit => &[70, 30],
        HapticEvent::DrumBeat => &[40, 20, 40],
        HapticEvent::Subtle => &[20],
        HapticEvent::BuildUp => &[30, 30, 50, 30, 80],
        HapticEvent::RhythmSync => &[50, 50, 50],
    }
}

/// Device vibration actuator. A new call supersedes any pattern in flight.
pub trait Vibrator {
    /// Feature detection; unsupported actuators are never called.
    fn is_supported(&self) -> bool {
        true
    }

    fn vibrate(&mut self, pattern: &[u32]) -> std::result::Result<(), PlaybackFault>;
}

/// Actuator for hosts without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVibrator;

impl Vibrator for NullVibrator {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&mut self, _pattern: &[u32]) -> std::result::Result<(), PlaybackFault> {
        Err(PlaybackFault::FeatureUnavailable)
    }
}

/// A pulse that was handed to the actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub event: HapticEvent,
    pub pattern: Vec<u32>,
}

/// Feedback bus: resolves symbolic events against the pattern table and
/// forwards them to the actuator.
pub struct Haptics {
    table: PatternTable,
    vibrator: Box<dyn Vibrator>,
    enabled: bool,
    intensity: f32,
    sent: Vec<Pulse>,
}

impl Haptics {
    pub fn new(config: &HapticsConfig, vibrator: Box<dyn Vibrator>) -> Self {
        let enabled = config.enabled && vibrator.is_supported();
        if config.enabled && !enabled {
            tracing::debug!("vibration actuator unavailable, haptics disabled");
        }
        Self {
            table: PatternTable::with_bounds(config.min_pulse_ms, config.max_pulse_ms),
            vibrator,
            enabled,
            intensity: config.intensity,
            sent: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Fires `event`. Returns the pulse that was sent, or `None` when haptics
    /// are off. An actuator failure disables haptics for the session.
    pub fn emit(&mut self, event: HapticEvent) -> Option<Pulse> {
        if !self.enabled {
            return None;
        }

        let pattern = self.table.resolve(event.name(), self.intensity * event.gain());
        match self.vibrator.vibrate(&pattern) {
            Ok(()) => {
                tracing::trace!(%event, ?pattern, "vibrate");
                let pulse = Pulse { event, pattern };
                self.sent.push(pulse.clone());
                Some(pulse)
            }
            Err(fault) => {
                tracing::debug!(%event, %fault, "vibration failed, disabling haptics");
                self.enabled = false;
                None
            }
        }
    }

    /// Pulses sent since the last call, oldest first.
    pub fn drain_pulses(&mut self) -> Vec<Pulse> {
        std::mem::take(&mut self.sent)
    }
}

impl fmt::Debug for Haptics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Haptics")
            .field("enabled", &self.enabled)
            .field("intensity", &self.intensity)
            .field("patterns", &self.table.patterns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Vec<u32>>>>);

    impl Vibrator for Recorder {
        fn vibrate(&mut self, pattern: &[u32]) -> std::result::Result<(), PlaybackFault> {
            self.0.borrow_mut().push(pattern.to_vec());
            Ok(())
        }
    }

    struct Broken;

    impl Vibrator for Broken {
        fn vibrate(&mut self, _: &[u32]) -> std::result::Result<(), PlaybackFault> {
            Err(PlaybackFault::FeatureUnavailable)
        }
    }

    #[test]
    fn unknown_names_use_default_pattern() {
        let table = PatternTable::default();
        assert_eq!(table.pattern("doesNotExist"), DEFAULT_PATTERN);
        assert_eq!(table.pattern("pause"), &[30, 50, 30]);
    }

    #[test]
    fn scaled_durations_stay_within_bounds() {
        let table = PatternTable::default();
        for intensity in [0.0, 0.01, 0.5, 1.0, 1.5, 3.0, 100.0, f32::NAN] {
            for event in HapticEvent::ALL {
                for ms in table.resolve(event.name(), intensity) {
                    assert!((10..=400).contains(&ms), "{event} at {intensity}: {ms}");
                }
            }
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        assert_eq!("bassHit".parse::<HapticEvent>().unwrap(), HapticEvent::BassHit);
        assert!("bass_hit".parse::<HapticEvent>().is_err());
    }

    #[test]
    fn drop_is_amplified() {
        let recorder = Recorder::default();
        let mut haptics = Haptics::new(&HapticsConfig::default(), Box::new(recorder.clone()));

        let pulse = haptics.emit(HapticEvent::Drop).unwrap();
        assert_eq!(pulse.pattern, vec![225, 75, 300]);
        assert_eq!(recorder.0.borrow().len(), 1);
        assert_eq!(haptics.drain_pulses(), vec![pulse]);
        assert!(haptics.drain_pulses().is_empty());
    }

    #[test]
    fn disabled_config_never_vibrates() {
        let recorder = Recorder::default();
        let config = HapticsConfig {
            enabled: false,
            ..Default::default()
        };
        let mut haptics = Haptics::new(&config, Box::new(recorder.clone()));

        assert!(haptics.emit(HapticEvent::Play).is_none());
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn actuator_failure_disables_the_bus() {
        let mut haptics = Haptics::new(&HapticsConfig::default(), Box::new(Broken));
        assert!(haptics.is_enabled());
        assert!(haptics.emit(HapticEvent::Play).is_none());
        assert!(!haptics.is_enabled());
    }

    #[test]
    fn unsupported_actuator_is_feature_detected() {
        let haptics = Haptics::new(&HapticsConfig::default(), Box::new(NullVibrator));
        assert!(!haptics.is_enabled());
    }
}

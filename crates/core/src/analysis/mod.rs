use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{AnalyzerConfig, HapticEvent, Result, VideoWallError};

/// Largest value a byte frequency bin can hold.
pub const MAX_AMPLITUDE: f32 = 255.0;

const DROP_LEVEL: f32 = 0.8;
const DROP_CHANGE: f32 = 0.4;
const INTENSE_CHANGE: f32 = 0.3;
const POWER_PULSE_BASS: f32 = 200.0;
const POWER_PULSE_CHANGE: f32 = 0.5;
const BASS_HIT_BASS: f32 = 180.0;
const BASS_HIT_CHANGE: f32 = 0.4;
const DRUM_BEAT_HIGH: f32 = 170.0;
const DRUM_BEAT_CHANGE: f32 = 0.35;
const SUBTLE_ULTRA: f32 = 120.0;
const SUBTLE_CHANGE: f32 = 0.25;
const BUILD_UP_RISE: f32 = 0.15;
const BUILD_UP_LEVEL: f32 = 0.6;
const RHYTHM_BASS: f32 = 150.0;
const RHYTHM_MID: f32 = 120.0;
const RHYTHM_CHANGE: f32 = 0.2;
const LOW_VOLUME: f32 = 50.0;
const MEDIUM_VOLUME: f32 = 120.0;

/// Mean byte level of the four frequency bands of one sample window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandLevels {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub ultra_high: f32,
}

impl BandLevels {
    /// Splits the bins into four equal quarters, lowest frequencies first,
    /// and averages each quarter. Empty quarters read as silence.
    pub fn from_bins(bins: &[u8]) -> Self {
        let len = bins.len();
        let band = |k: usize| mean(&bins[len * k / 4..len * (k + 1) / 4]);
        Self {
            bass: band(0),
            mid: band(1),
            high: band(2),
            ultra_high: band(3),
        }
    }

    /// `mean(bass, mid, high)` normalised to [0, 1].
    pub fn overall_intensity(&self) -> f32 {
        (self.bass + self.mid + self.high) / 3.0 / MAX_AMPLITUDE
    }
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&bin| f32::from(bin)).sum::<f32>() / bins.len() as f32
}

/// Coarse loudness bucket derived from the average of all bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl IntensityLevel {
    pub fn from_volume(volume: f32) -> Self {
        if volume < LOW_VOLUME {
            Self::Low
        } else if volume < MEDIUM_VOLUME {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Everything derived from one sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoudnessReading {
    pub levels: BandLevels,
    pub level: IntensityLevel,
    pub overall_intensity: f32,
    pub previous_intensity: f32,
    pub intensity_change: f32,
    pub events: Vec<HapticEvent>,
}

/// Turns byte frequency data into symbolic vibration events.
///
/// Every rule is evaluated on each sample and several may fire in the same
/// tick. Within the two exclusive pairs the stronger rule wins: `drop` over
/// `intense`, and `powerPulse` over `bassHit`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessAnalyzer {
    intense_threshold: f32,
    previous_intensity: f32,
}

impl Default for LoudnessAnalyzer {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl LoudnessAnalyzer {
    pub fn new(intense_threshold: f32) -> Self {
        Self {
            intense_threshold,
            previous_intensity: 0.0,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.intense_threshold)
    }

    pub fn previous_intensity(&self) -> f32 {
        self.previous_intensity
    }

    /// Forgets the intensity history, e.g. when a new tap is attached.
    pub fn reset(&mut self) {
        self.previous_intensity = 0.0;
    }

    /// Classifies one window and records its intensity for the next call.
    pub fn analyze(&mut self, bins: &[u8]) -> LoudnessReading {
        let levels = BandLevels::from_bins(bins);
        let overall_intensity = levels.overall_intensity();
        let previous_intensity = self.previous_intensity;
        let events = self.classify(&levels, previous_intensity);
        self.previous_intensity = overall_intensity;

        LoudnessReading {
            levels,
            level: IntensityLevel::from_volume(mean(bins)),
            overall_intensity,
            previous_intensity,
            intensity_change: (overall_intensity - previous_intensity).abs(),
            events,
        }
    }

    /// Pure rule evaluation against an explicit previous intensity.
    pub fn classify(&self, levels: &BandLevels, previous_intensity: f32) -> Vec<HapticEvent> {
        let overall = levels.overall_intensity();
        let change = (overall - previous_intensity).abs();
        let mut events = Vec::new();

        if overall > DROP_LEVEL && change > DROP_CHANGE {
            events.push(HapticEvent::Drop);
        } else if overall > self.intense_threshold && change > INTENSE_CHANGE {
            events.push(HapticEvent::Intense);
        }

        if levels.bass > POWER_PULSE_BASS && change > POWER_PULSE_CHANGE {
            events.push(HapticEvent::PowerPulse);
        } else if levels.bass > BASS_HIT_BASS && change > BASS_HIT_CHANGE {
            events.push(HapticEvent::BassHit);
        }

        if levels.high > DRUM_BEAT_HIGH && change > DRUM_BEAT_CHANGE {
            events.push(HapticEvent::DrumBeat);
        }

        if levels.ultra_high > SUBTLE_ULTRA && change > SUBTLE_CHANGE {
            events.push(HapticEvent::Subtle);
        }

        if overall > previous_intensity + BUILD_UP_RISE && overall > BUILD_UP_LEVEL {
            events.push(HapticEvent::BuildUp);
        }

        if levels.bass > RHYTHM_BASS && levels.mid > RHYTHM_MID && change > RHYTHM_CHANGE {
            events.push(HapticEvent::RhythmSync);
        }

        events
    }
}

/// Software frequency analyser producing byte frequency data the way a
/// browser analyser node does: Hann window, magnitude spectrum, exponential
/// smoothing over time and decibel quantisation.
pub struct SpectrumAnalyser {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    smoothed: Vec<f32>,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl SpectrumAnalyser {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            fft_size: config.fft_size,
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            smoothed: vec![0.0; config.fft_size / 2],
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins written by [`SpectrumAnalyser::byte_frequency_data`].
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyses the most recent `fft_size` samples and writes one byte per
    /// bin into `out`. Shorter inputs are zero-padded at the front.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) -> Result<()> {
        let size = self.fft_size;
        let smoothing = self.smoothing;
        let (min_db, max_db) = (self.min_decibels, self.max_decibels);
        let fft = prepare_fft(&mut self.fft, &mut self.fft_planner, size);

        let recent = &samples[samples.len().saturating_sub(size)..];
        let offset = size - recent.len();
        fft.input.iter_mut().for_each(|value| *value = 0.0);
        for (index, value) in recent.iter().enumerate() {
            let position = offset + index;
            fft.input[position] = *value * hann_value(position, size);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
            .map_err(|err| VideoWallError::msg(format!("fft failed: {err}")))?;

        let scale = 1.0 / size as f32;
        let range = max_db - min_db;
        for (bin, (smoothed, spectrum)) in self
            .smoothed
            .iter_mut()
            .zip(fft.spectrum.iter())
            .enumerate()
        {
            let magnitude = spectrum.norm() * scale;
            *smoothed = smoothing * *smoothed + (1.0 - smoothing) * magnitude;

            if let Some(slot) = out.get_mut(bin) {
                let decibels = if *smoothed > 0.0 {
                    20.0 * smoothed.log10()
                } else {
                    f32::NEG_INFINITY
                };
                let scaled = MAX_AMPLITUDE * (decibels - min_db) / range;
                *slot = scaled.clamp(0.0, MAX_AMPLITUDE) as u8;
            }
        }

        Ok(())
    }

    /// Clears the smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|value| *value = 0.0);
    }
}

fn prepare_fft<'a>(
    slot: &'a mut Option<FftResources>,
    planner: &mut RealFftPlanner<f32>,
    size: usize,
) -> &'a mut FftResources {
    if slot.as_ref().map_or(true, |fft| fft.size != size) {
        *slot = None;
    }
    slot.get_or_insert_with(|| FftResources::new(planner, size))
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(planner: &mut RealFftPlanner<f32>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        Self {
            size,
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("min_decibels", &self.min_decibels)
            .field("max_decibels", &self.max_decibels)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn flat(level: f32) -> BandLevels {
        BandLevels {
            bass: level,
            mid: level,
            high: level,
            ultra_high: 0.0,
        }
    }

    #[test]
    fn splits_bins_into_quarters() {
        let bins = [10, 10, 20, 20, 30, 30, 40, 40];
        let levels = BandLevels::from_bins(&bins);
        assert_eq!(levels.bass, 10.0);
        assert_eq!(levels.mid, 20.0);
        assert_eq!(levels.high, 30.0);
        assert_eq!(levels.ultra_high, 40.0);
        assert_relative_eq!(levels.overall_intensity(), 20.0 / 255.0);
    }

    #[test]
    fn tiny_bin_counts_do_not_panic() {
        assert_eq!(BandLevels::from_bins(&[]), BandLevels::default());
        let levels = BandLevels::from_bins(&[200]);
        assert_eq!(levels.ultra_high, 200.0);
    }

    #[test]
    fn drop_takes_precedence_over_intense() {
        let analyzer = LoudnessAnalyzer::default();
        let levels = flat(0.85 * MAX_AMPLITUDE);
        let events = analyzer.classify(&levels, 0.3);

        assert!(events.contains(&HapticEvent::Drop));
        assert!(!events.contains(&HapticEvent::Intense));
    }

    #[test]
    fn intense_fires_below_drop_level() {
        let analyzer = LoudnessAnalyzer::default();
        let levels = flat(0.75 * MAX_AMPLITUDE);
        let events = analyzer.classify(&levels, 0.4);

        assert!(events.contains(&HapticEvent::Intense));
        assert!(!events.contains(&HapticEvent::Drop));
    }

    #[test]
    fn power_pulse_supersedes_bass_hit() {
        let analyzer = LoudnessAnalyzer::default();
        let levels = BandLevels {
            bass: 250.0,
            mid: 200.0,
            high: 0.0,
            ultra_high: 0.0,
        };
        let events = analyzer.classify(&levels, 0.0);
        assert!(events.contains(&HapticEvent::PowerPulse));
        assert!(!events.contains(&HapticEvent::BassHit));

        let softer = BandLevels {
            bass: 190.0,
            mid: 130.0,
            high: 0.0,
            ultra_high: 0.0,
        };
        let events = analyzer.classify(&softer, 0.0);
        assert!(events.contains(&HapticEvent::BassHit));
        assert!(events.contains(&HapticEvent::RhythmSync));
    }

    #[test]
    fn steady_signal_is_quiet() {
        let mut analyzer = LoudnessAnalyzer::default();
        let bins = [180u8; 16];
        let first = analyzer.analyze(&bins);
        assert!(!first.events.is_empty());

        let second = analyzer.analyze(&bins);
        assert_eq!(second.intensity_change, 0.0);
        assert!(second.events.is_empty());
        assert_eq!(second.level, IntensityLevel::High);
    }

    #[test]
    fn previous_intensity_updates_every_tick() {
        let mut analyzer = LoudnessAnalyzer::default();
        analyzer.analyze(&[51u8; 16]);
        assert_relative_eq!(analyzer.previous_intensity(), 0.2);
        analyzer.analyze(&[0u8; 16]);
        assert_eq!(analyzer.previous_intensity(), 0.0);
    }

    #[test]
    fn volume_buckets() {
        assert_eq!(IntensityLevel::from_volume(10.0), IntensityLevel::Low);
        assert_eq!(IntensityLevel::from_volume(50.0), IntensityLevel::Medium);
        assert_eq!(IntensityLevel::from_volume(120.0), IntensityLevel::High);
    }

    #[test]
    fn silence_maps_to_zero_bins() {
        let mut spectrum = SpectrumAnalyser::new(&AnalyzerConfig::default());
        let mut out = [7u8; 16];
        spectrum.byte_frequency_data(&[0.0; 32], &mut out).unwrap();
        assert!(out.iter().all(|&bin| bin == 0));
    }

    #[test]
    fn low_tone_lights_up_the_bass_band() {
        let config = AnalyzerConfig {
            smoothing: 0.0,
            ..Default::default()
        };
        let mut spectrum = SpectrumAnalyser::new(&config);
        let size = spectrum.fft_size();
        let samples: Vec<f32> = (0..size)
            .map(|n| (2.0 * PI * 2.0 * n as f32 / size as f32).sin())
            .collect();
        let mut out = vec![0u8; spectrum.bin_count()];
        spectrum.byte_frequency_data(&samples, &mut out).unwrap();

        let levels = BandLevels::from_bins(&out);
        assert!(levels.bass > levels.ultra_high);
        assert!(out[2] > 200);
    }
}

use std::fmt;

use crate::{
    AnalyzerConfig, LoudnessAnalyzer, LoudnessReading, PlaybackFault, SpectrumAnalyser,
};

/// Live frequency-bin view of one clip's audio output.
pub trait FrequencyTap {
    fn bin_count(&self) -> usize;

    /// Writes the current byte frequency data into `out`.
    fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), PlaybackFault>;

    /// Releases the underlying audio graph.
    fn disconnect(&mut self) {}
}

/// Creates taps on demand. Hosts without audio analysis return
/// [`PlaybackFault::FeatureUnavailable`].
pub trait AnalyzerBackend {
    fn connect(
        &mut self,
        card: usize,
        config: &AnalyzerConfig,
    ) -> Result<Box<dyn FrequencyTap>, PlaybackFault>;
}

/// Backend for hosts with no audio analysis support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAnalyzer;

impl AnalyzerBackend for NoAnalyzer {
    fn connect(
        &mut self,
        _card: usize,
        _config: &AnalyzerConfig,
    ) -> Result<Box<dyn FrequencyTap>, PlaybackFault> {
        Err(PlaybackFault::FeatureUnavailable)
    }
}

/// Supplies time-domain samples of the clip currently being tapped.
pub trait PcmSource {
    /// Fills `buffer` with the most recent samples in [-1, 1].
    fn fill(&mut self, buffer: &mut [f32]);
}

/// A [`FrequencyTap`] computed in software from raw samples.
pub struct PcmTap<S> {
    source: S,
    spectrum: SpectrumAnalyser,
    samples: Vec<f32>,
}

impl<S: PcmSource> PcmTap<S> {
    pub fn new(source: S, config: &AnalyzerConfig) -> Self {
        let spectrum = SpectrumAnalyser::new(config);
        let samples = vec![0.0; spectrum.fft_size()];
        Self {
            source,
            spectrum,
            samples,
        }
    }
}

impl<S: PcmSource> FrequencyTap for PcmTap<S> {
    fn bin_count(&self) -> usize {
        self.spectrum.bin_count()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), PlaybackFault> {
        self.source.fill(&mut self.samples);
        self.spectrum
            .byte_frequency_data(&self.samples, out)
            .map_err(|err| {
                tracing::debug!(%err, "spectrum analysis failed");
                PlaybackFault::FeatureUnavailable
            })
    }

    fn disconnect(&mut self) {
        self.spectrum.reset();
    }
}

impl<S> fmt::Debug for PcmTap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmTap")
            .field("spectrum", &self.spectrum)
            .finish()
    }
}

/// A live connection from the active card's audio to the loudness analyzer.
pub struct AudioTap {
    card: usize,
    tap: Box<dyn FrequencyTap>,
    analyzer: LoudnessAnalyzer,
    bins: Vec<u8>,
}

impl AudioTap {
    pub fn card(&self) -> usize {
        self.card
    }

    /// Reads one window and classifies it.
    pub fn sample(&mut self) -> Result<LoudnessReading, PlaybackFault> {
        self.tap.byte_frequency_data(&mut self.bins)?;
        Ok(self.analyzer.analyze(&self.bins))
    }
}

impl fmt::Debug for AudioTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioTap")
            .field("card", &self.card)
            .field("bins", &self.bins.len())
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

/// Holds the single system-wide [`AudioTap`].
///
/// Setup failures disable the feature for the rest of the session instead
/// of surfacing to the user.
pub struct TapSlot {
    backend: Box<dyn AnalyzerBackend>,
    config: AnalyzerConfig,
    tap: Option<AudioTap>,
    disabled: bool,
}

impl TapSlot {
    pub fn new(config: &AnalyzerConfig, backend: Box<dyn AnalyzerBackend>) -> Self {
        Self {
            backend,
            config: config.clone(),
            tap: None,
            disabled: !config.enabled,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_attached(&self) -> bool {
        self.tap.is_some()
    }

    /// Card that owns the live tap, if any.
    pub fn owner(&self) -> Option<usize> {
        self.tap.as_ref().map(AudioTap::card)
    }

    /// Ensures a tap exists for `card`. An existing tap for the same card is
    /// reused; one for another card is torn down first. Returns whether a tap
    /// is live for `card` afterwards.
    pub fn attach(&mut self, card: usize) -> bool {
        if self.disabled {
            return false;
        }
        match self.owner() {
            Some(owner) if owner == card => return true,
            Some(_) => self.detach(),
            None => {}
        }

        match self.backend.connect(card, &self.config) {
            Ok(tap) => {
                let bins = vec![0; tap.bin_count()];
                tracing::debug!(card, bins = bins.len(), "audio tap attached");
                self.tap = Some(AudioTap {
                    card,
                    tap,
                    analyzer: LoudnessAnalyzer::from_config(&self.config),
                    bins,
                });
                true
            }
            Err(fault) => {
                tracing::debug!(card, %fault, "audio analysis unavailable for this session");
                self.disabled = true;
                false
            }
        }
    }

    /// Tears down the live tap, if any.
    pub fn detach(&mut self) {
        if let Some(mut tap) = self.tap.take() {
            tap.tap.disconnect();
            tracing::debug!(card = tap.card, "audio tap detached");
        }
    }

    /// Samples the live tap. A failing tap is dropped and the feature is
    /// disabled for the session.
    pub fn sample(&mut self) -> Option<LoudnessReading> {
        let tap = self.tap.as_mut()?;
        match tap.sample() {
            Ok(reading) => Some(reading),
            Err(fault) => {
                tracing::debug!(%fault, "audio tap failed, disabling analysis");
                self.detach();
                self.disabled = true;
                None
            }
        }
    }
}

impl fmt::Debug for TapSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapSlot")
            .field("tap", &self.tap)
            .field("disabled", &self.disabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::HapticEvent;

    struct Constant(u8);

    impl FrequencyTap for Constant {
        fn bin_count(&self) -> usize {
            16
        }

        fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), PlaybackFault> {
            out.fill(self.0);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingBackend {
        connects: Rc<Cell<usize>>,
    }

    impl AnalyzerBackend for CountingBackend {
        fn connect(
            &mut self,
            _card: usize,
            _config: &AnalyzerConfig,
        ) -> Result<Box<dyn FrequencyTap>, PlaybackFault> {
            self.connects.set(self.connects.get() + 1);
            Ok(Box::new(Constant(230)))
        }
    }

    #[test]
    fn reuses_tap_for_same_card() {
        let backend = CountingBackend::default();
        let mut slot = TapSlot::new(&AnalyzerConfig::default(), Box::new(backend.clone()));

        assert!(slot.attach(2));
        assert!(slot.attach(2));
        assert_eq!(backend.connects.get(), 1);
        assert_eq!(slot.owner(), Some(2));
    }

    #[test]
    fn attaching_elsewhere_replaces_the_tap() {
        let backend = CountingBackend::default();
        let mut slot = TapSlot::new(&AnalyzerConfig::default(), Box::new(backend.clone()));

        slot.attach(0);
        slot.attach(1);
        assert_eq!(slot.owner(), Some(1));
        assert_eq!(backend.connects.get(), 2);
    }

    #[test]
    fn missing_backend_disables_analysis() {
        let mut slot = TapSlot::new(&AnalyzerConfig::default(), Box::new(NoAnalyzer));
        assert!(!slot.attach(0));
        assert!(slot.is_disabled());
        assert!(slot.sample().is_none());
    }

    #[test]
    fn disabled_config_never_connects() {
        let backend = CountingBackend::default();
        let config = AnalyzerConfig {
            enabled: false,
            ..Default::default()
        };
        let mut slot = TapSlot::new(&config, Box::new(backend.clone()));
        assert!(!slot.attach(0));
        assert_eq!(backend.connects.get(), 0);
    }

    #[test]
    fn samples_loud_signal() {
        let mut slot = TapSlot::new(
            &AnalyzerConfig::default(),
            Box::new(CountingBackend::default()),
        );
        slot.attach(0);
        let reading = slot.sample().unwrap();
        assert!(reading.events.contains(&HapticEvent::Drop));

        slot.detach();
        assert!(slot.sample().is_none());
    }

    struct Sine {
        phase: f32,
    }

    impl PcmSource for Sine {
        fn fill(&mut self, buffer: &mut [f32]) {
            for sample in buffer.iter_mut() {
                *sample = self.phase.sin();
                self.phase += 0.4;
            }
        }
    }

    #[test]
    fn pcm_tap_produces_bins() {
        let config = AnalyzerConfig::default();
        let mut tap = PcmTap::new(Sine { phase: 0.0 }, &config);
        let mut out = vec![0; tap.bin_count()];
        tap.byte_frequency_data(&mut out).unwrap();
        assert_eq!(out.len(), 16);
        assert!(out.iter().any(|&bin| bin > 0));
    }
}

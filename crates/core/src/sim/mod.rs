//! Deterministic stand-ins for the host: a media element that plays in
//! virtual time, a vibration motor that records patterns, a synthetic audio
//! source and a [`Simulation`] that drives a whole wall from a scenario.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    f32::consts::PI,
    fmt,
    rc::Rc,
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    AnalyzerBackend, AnalyzerConfig, AppConfig, Catalog, FrequencyTap, MediaElement, MediaEvent,
    PcmSource, PcmTap, PlaybackFault, ReadyState, Result, UserAction, Vibrator, Wall, WallNotice,
};

const SAMPLE_RATE: f32 = 48_000.0;
const KICK_HZ: f32 = 55.0;

#[derive(Debug)]
struct MediaModel {
    duration: f64,
    load_latency: Duration,
    never_ready: bool,
    error_at: Option<f64>,
    autoplay_allowed: bool,
    src: Option<String>,
    ready: ReadyState,
    paused: bool,
    current_time: f64,
    loading_for: Option<Duration>,
    events: Vec<MediaEvent>,
    loads: usize,
    plays: usize,
}

/// Media element that plays in virtual time. Clones share state, so a test
/// or simulation can keep a handle while the wall owns another.
#[derive(Clone)]
pub struct SimulatedMedia {
    model: Rc<RefCell<MediaModel>>,
}

impl SimulatedMedia {
    /// A clip of `duration` seconds that becomes ready on the next step.
    pub fn new(duration: f64) -> Self {
        Self {
            model: Rc::new(RefCell::new(MediaModel {
                duration,
                load_latency: Duration::ZERO,
                never_ready: false,
                error_at: None,
                autoplay_allowed: true,
                src: None,
                ready: ReadyState::HaveNothing,
                paused: true,
                current_time: 0.0,
                loading_for: None,
                events: Vec::new(),
                loads: 0,
                plays: 0,
            })),
        }
    }

    pub fn with_load_latency(self, latency: Duration) -> Self {
        self.model.borrow_mut().load_latency = latency;
        self
    }

    /// The clip stalls forever while loading.
    pub fn never_ready(self) -> Self {
        self.model.borrow_mut().never_ready = true;
        self
    }

    /// The clip raises a decode error once playback reaches `seconds`.
    pub fn fail_at(self, seconds: f64) -> Self {
        self.model.borrow_mut().error_at = Some(seconds);
        self
    }

    pub fn set_autoplay_allowed(&self, allowed: bool) {
        self.model.borrow_mut().autoplay_allowed = allowed;
    }

    /// Starts playback behind the controller's back.
    pub fn force_play(&self) {
        let mut model = self.model.borrow_mut();
        if model.paused {
            model.paused = false;
            model.events.push(MediaEvent::Play);
        }
    }

    pub fn has_source(&self) -> bool {
        self.model.borrow().src.is_some()
    }

    pub fn load_count(&self) -> usize {
        self.model.borrow().loads
    }

    pub fn play_count(&self) -> usize {
        self.model.borrow().plays
    }

    /// Moves virtual time forward by `dt`, finishing loads and playing.
    pub fn advance(&self, dt: Duration) {
        let mut model = self.model.borrow_mut();
        if model.src.is_none() {
            return;
        }

        if let Some(elapsed) = model.loading_for {
            let elapsed = elapsed + dt;
            if !model.never_ready && elapsed >= model.load_latency {
                model.loading_for = None;
                model.ready = ReadyState::HaveEnoughData;
                model.events.push(MediaEvent::LoadedData);
                model.events.push(MediaEvent::CanPlay);
            } else {
                model.loading_for = Some(elapsed);
            }
        }

        if model.paused || !model.ready.has_current_data() {
            return;
        }

        model.current_time += dt.as_secs_f64();
        if let Some(at) = model.error_at {
            if model.current_time >= at {
                model.error_at = None;
                model.paused = true;
                model.events.push(MediaEvent::Error);
                return;
            }
        }

        model.events.push(MediaEvent::TimeUpdate);
        if model.current_time >= model.duration {
            model.current_time = model.duration;
            model.paused = true;
            model.events.push(MediaEvent::Pause);
            model.events.push(MediaEvent::Ended);
        }
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, src: &str) {
        let mut model = self.model.borrow_mut();
        model.src = Some(src.to_string());
        model.ready = ReadyState::HaveNothing;
        model.paused = true;
        model.current_time = 0.0;
        model.loading_for = Some(Duration::ZERO);
        model.loads += 1;
        model.events.push(MediaEvent::LoadStart);
    }

    fn unload(&mut self) {
        let mut model = self.model.borrow_mut();
        model.src = None;
        model.ready = ReadyState::HaveNothing;
        model.paused = true;
        model.current_time = 0.0;
        model.loading_for = None;
    }

    fn play(&mut self) -> std::result::Result<(), PlaybackFault> {
        let mut model = self.model.borrow_mut();
        if model.src.is_none() {
            return Err(PlaybackFault::DecodeOrPlayback);
        }
        if !model.autoplay_allowed {
            return Err(PlaybackFault::AutoplayRejected);
        }
        model.plays += 1;
        if model.current_time >= model.duration {
            model.current_time = 0.0;
        }
        if model.paused {
            model.paused = false;
            model.events.push(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut model = self.model.borrow_mut();
        if !model.paused {
            model.paused = true;
            model.events.push(MediaEvent::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.model.borrow().paused
    }

    fn ready_state(&self) -> ReadyState {
        self.model.borrow().ready
    }

    fn duration(&self) -> Option<f64> {
        let model = self.model.borrow();
        model.ready.has_current_data().then_some(model.duration)
    }

    fn current_time(&self) -> f64 {
        self.model.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut model = self.model.borrow_mut();
        model.current_time = seconds.clamp(0.0, model.duration);
    }

    fn drain_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.model.borrow_mut().events)
    }
}

impl fmt::Debug for SimulatedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model.borrow();
        f.debug_struct("SimulatedMedia")
            .field("src", &model.src)
            .field("ready", &model.ready)
            .field("paused", &model.paused)
            .field("current_time", &model.current_time)
            .finish()
    }
}

/// Vibration motor that records every pattern it is asked to play.
#[derive(Debug, Clone, Default)]
pub struct RecordingVibrator {
    patterns: Rc<RefCell<Vec<Vec<u32>>>>,
}

impl RecordingVibrator {
    pub fn patterns(&self) -> Vec<Vec<u32>> {
        self.patterns.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.patterns.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.borrow().is_empty()
    }
}

impl Vibrator for RecordingVibrator {
    fn vibrate(&mut self, pattern: &[u32]) -> std::result::Result<(), PlaybackFault> {
        self.patterns.borrow_mut().push(pattern.to_vec());
        Ok(())
    }
}

/// Four-on-the-floor kick with an off-beat hi-hat, rendered at 48 kHz and
/// advanced by one display frame per read.
pub struct BeatSource {
    bpm: f32,
    frame_step: u64,
    position: u64,
    rng: StdRng,
}

impl BeatSource {
    pub fn new(bpm: f32, frame_rate: u32, seed: u64) -> Self {
        Self {
            bpm,
            frame_step: (SAMPLE_RATE / frame_rate.max(1) as f32) as u64,
            position: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PcmSource for BeatSource {
    fn fill(&mut self, buffer: &mut [f32]) {
        self.position += self.frame_step;
        let beats_per_second = self.bpm / 60.0;
        for (offset, sample) in buffer.iter_mut().enumerate() {
            let t = (self.position + offset as u64) as f32 / SAMPLE_RATE;
            let phase = (t * beats_per_second).fract();
            let kick = (-phase * 12.0).exp() * (2.0 * PI * KICK_HZ * t).sin();
            let hat = (-(phase - 0.5).abs() * 40.0).exp() * self.rng.gen_range(-1.0..1.0);
            *sample = (0.8 * kick + 0.3 * hat).clamp(-1.0, 1.0);
        }
    }
}

impl fmt::Debug for BeatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeatSource")
            .field("bpm", &self.bpm)
            .field("position", &self.position)
            .finish()
    }
}

/// Analyzer backend that taps a [`BeatSource`] for whichever card plays.
#[derive(Debug, Clone)]
pub struct SyntheticAnalyzer {
    seed: u64,
    bpm: f32,
    frame_rate: u32,
}

impl SyntheticAnalyzer {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            bpm: 120.0,
            frame_rate: 60,
        }
    }

    pub fn with_tempo(mut self, bpm: f32, frame_rate: u32) -> Self {
        self.bpm = bpm;
        self.frame_rate = frame_rate;
        self
    }
}

impl AnalyzerBackend for SyntheticAnalyzer {
    fn connect(
        &mut self,
        card: usize,
        config: &AnalyzerConfig,
    ) -> std::result::Result<Box<dyn FrequencyTap>, PlaybackFault> {
        let source = BeatSource::new(self.bpm, self.frame_rate, self.seed ^ card as u64);
        Ok(Box::new(PcmTap::new(source, config)))
    }
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    pub action: UserAction,
}

/// Description of a simulated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub clip_seconds: f64,
    pub load_latency_ms: u64,
    pub frame_rate: u32,
    pub run_for_ms: u64,
    pub bpm: f32,
    pub seed: u64,
    /// Clips that never finish loading.
    pub stalled_clips: Vec<usize>,
    /// Whether playback is refused until the first user interaction.
    pub require_gesture: bool,
    pub steps: Vec<ScriptStep>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            clip_seconds: 6.0,
            load_latency_ms: 250,
            frame_rate: 60,
            run_for_ms: 20_000,
            bpm: 120.0,
            seed: 1,
            stalled_clips: Vec::new(),
            require_gesture: false,
            // A touch too short to count as a swipe.
            steps: vec![ScriptStep {
                at_ms: 500,
                action: UserAction::Swipe {
                    from_y: 400.0,
                    to_y: 400.0,
                },
            }],
        }
    }
}

impl Scenario {
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A notice together with the virtual time it was produced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedNotice {
    pub at_ms: u64,
    #[serde(flatten)]
    pub notice: WallNotice,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub notices: Vec<TimedNotice>,
    pub final_active: usize,
    pub frames_sampled: usize,
    pub pulses_by_event: BTreeMap<String, usize>,
    pub visited: Vec<usize>,
}

/// Drives a [`Wall`] over simulated media in fixed display-refresh steps.
pub struct Simulation {
    wall: Wall,
    media: Vec<SimulatedMedia>,
    scenario: Scenario,
    vibrations: RecordingVibrator,
}

impl Simulation {
    pub fn new(config: AppConfig, catalog: Catalog, scenario: Scenario) -> Result<Self> {
        let latency = Duration::from_millis(scenario.load_latency_ms);
        let media: Vec<_> = (0..catalog.len())
            .map(|index| {
                let media = SimulatedMedia::new(scenario.clip_seconds).with_load_latency(latency);
                media.set_autoplay_allowed(!scenario.require_gesture);
                if scenario.stalled_clips.contains(&index) {
                    media.never_ready()
                } else {
                    media
                }
            })
            .collect();

        let vibrations = RecordingVibrator::default();
        let handles = media.clone();
        let analyzer =
            SyntheticAnalyzer::new(scenario.seed).with_tempo(scenario.bpm, scenario.frame_rate);
        let wall = Wall::new(config, catalog, |index, _| Box::new(handles[index].clone()))?
            .with_vibrator(Box::new(vibrations.clone()))
            .with_analyzer(Box::new(analyzer));

        Ok(Self {
            wall,
            media,
            scenario,
            vibrations,
        })
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn wall_mut(&mut self) -> &mut Wall {
        &mut self.wall
    }

    pub fn vibrations(&self) -> &RecordingVibrator {
        &self.vibrations
    }

    /// Runs the scenario to completion.
    pub fn run(&mut self) -> SimReport {
        let frame = Duration::from_secs_f64(1.0 / f64::from(self.scenario.frame_rate.max(1)));
        let end = Duration::from_millis(self.scenario.run_for_ms);
        let mut steps = self.scenario.steps.clone();
        steps.sort_by_key(|step| step.at_ms);
        let mut steps = steps.into_iter().peekable();

        let mut report = SimReport::default();
        report.visited.push(self.wall.active_index());

        self.wall.mount();
        self.collect(Duration::ZERO, &mut report);

        let mut now = Duration::ZERO;
        while now < end {
            now += frame;
            self.wall.advance_clock(now);

            while let Some(step) = steps.next_if(|step| Duration::from_millis(step.at_ms) <= now) {
                tracing::debug!(at_ms = step.at_ms, action = ?step.action, "scripted input");
                if matches!(
                    step.action,
                    UserAction::Tap { .. } | UserAction::Swipe { .. } | UserAction::Key { .. }
                ) {
                    self.grant_gesture();
                }
                self.wall.dispatch(&step.action);
            }

            for media in &self.media {
                media.advance(frame);
            }
            self.wall.pump();

            if self.wall.animation_frame(now).is_some() {
                report.frames_sampled += 1;
            }
            self.collect(now, &mut report);
        }

        self.wall.unmount();
        self.collect(now, &mut report);
        report.final_active = self.wall.active_index();
        report
    }

    fn grant_gesture(&self) {
        for media in &self.media {
            media.set_autoplay_allowed(true);
        }
    }

    fn collect(&mut self, now: Duration, report: &mut SimReport) {
        let at_ms = now.as_millis() as u64;
        for notice in self.wall.drain_notices() {
            match &notice {
                WallNotice::Pulse(pulse) => {
                    *report
                        .pulses_by_event
                        .entry(pulse.event.name().to_string())
                        .or_default() += 1;
                }
                WallNotice::ActiveChanged { to, .. } => report.visited.push(*to),
                _ => {}
            }
            report.notices.push(TimedNotice { at_ms, notice });
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("wall", &self.wall)
            .field("media", &self.media.len())
            .field("scenario", &self.scenario)
            .finish()
    }
}

//! The video wall: a host-driven container that owns the feed, one card per
//! clip, the audio tap and the feedback bus.
//!
//! Hosts push input ([`Wall::dispatch`], [`Wall::media_event`]), advance time
//! ([`Wall::advance_clock`], [`Wall::animation_frame`]) and drain
//! [`WallNotice`]s to render. Nothing here blocks or reads wall-clock time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    residency, AnalyzerBackend, AnimationLoop, AppConfig, CardContext, CardController, CardPhase,
    CardState, CardTimer, Catalog, ClipEntry, Direction, FeedCoordinator, HapticEvent, Haptics,
    HostClock, KeyCommand, KeySequence, LoudnessReading, MediaElement, MediaEvent, NoAnalyzer,
    NullVibrator, Pulse, Residency, Result, Scheduler, SwipeTracker, TapSlot, Vibrator,
    VideoWallError,
};

/// Input the host forwards to the wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserAction {
    /// Tap or click on a card; `None` targets the active card.
    Tap { card: Option<usize> },
    /// A complete vertical touch gesture.
    Swipe { from_y: f32, to_y: f32 },
    /// A key press, by `KeyboardEvent.code`.
    Key { code: String },
    /// Forward/back controls.
    Navigate { direction: Direction },
    JumpTo { index: usize },
}

/// Something the host should render or report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WallNotice {
    ActiveChanged { from: usize, to: usize },
    Phase { card: usize, phase: CardPhase },
    Progress { card: usize, fraction: f32 },
    Pulse(Pulse),
    TurboMode { enabled: bool },
}

/// State shared by every card. Kept apart from the card list so that a card
/// and its context can be borrowed at the same time.
struct WallEnv {
    config: AppConfig,
    feed: FeedCoordinator,
    clock: HostClock,
    haptics: Haptics,
    timers: Scheduler<CardTimer>,
    autoplay: bool,
}

impl WallEnv {
    fn ctx(&mut self) -> CardContext<'_> {
        CardContext {
            now: self.clock.now(),
            active: self.feed.active(),
            len: self.feed.len(),
            autoplay: self.autoplay,
            playback: &self.config.playback,
            haptics: &mut self.haptics,
            timers: &mut self.timers,
        }
    }
}

pub struct Wall {
    catalog: Catalog,
    cards: Vec<CardController>,
    env: WallEnv,
    taps: TapSlot,
    frames: AnimationLoop,
    swipe: SwipeTracker,
    keys: KeySequence,
    turbo: bool,
    user_interacted: bool,
    mounted: bool,
    phases: Vec<CardPhase>,
    progress: Vec<f32>,
    notices: Vec<WallNotice>,
}

impl Wall {
    /// Builds one card per catalog entry, asking `media` for each card's
    /// playback element. Vibration and audio analysis start out unavailable;
    /// see [`Wall::with_vibrator`] and [`Wall::with_analyzer`].
    pub fn new<F>(config: AppConfig, catalog: Catalog, mut media: F) -> Result<Self>
    where
        F: FnMut(usize, &ClipEntry) -> Box<dyn MediaElement>,
    {
        config.validate()?;
        if catalog.is_empty() {
            return Err(VideoWallError::InvalidCatalog(
                "catalog needs at least one clip".to_string(),
            ));
        }

        let cards: Vec<_> = catalog
            .entries()
            .iter()
            .enumerate()
            .map(|(index, clip)| CardController::new(index, clip.clone(), media(index, clip)))
            .collect();

        let env = WallEnv {
            feed: FeedCoordinator::new(cards.len()),
            clock: HostClock::new(),
            haptics: Haptics::new(&config.haptics, Box::new(NullVibrator)),
            timers: Scheduler::new(),
            autoplay: config.playback.autoplay,
            config,
        };

        Ok(Self {
            taps: TapSlot::new(&env.config.analyzer, Box::new(NoAnalyzer)),
            swipe: SwipeTracker::new(env.config.feed.swipe_threshold),
            keys: KeySequence::cheat_code(),
            phases: cards.iter().map(CardController::phase).collect(),
            progress: cards.iter().map(CardController::progress).collect(),
            catalog,
            cards,
            env,
            frames: AnimationLoop::new(),
            turbo: false,
            user_interacted: false,
            mounted: false,
            notices: Vec::new(),
        })
    }

    pub fn with_vibrator(mut self, vibrator: Box<dyn Vibrator>) -> Self {
        self.env.haptics = Haptics::new(&self.env.config.haptics, vibrator);
        self
    }

    pub fn with_analyzer(mut self, backend: Box<dyn AnalyzerBackend>) -> Self {
        self.taps = TapSlot::new(&self.env.config.analyzer, backend);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.env.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.env.feed.active()
    }

    pub fn card(&self, index: usize) -> Option<&CardController> {
        self.cards.get(index)
    }

    pub fn card_state(&self, index: usize) -> Option<CardState> {
        self.cards.get(index).map(CardController::state)
    }

    pub fn card_states(&self) -> Vec<CardState> {
        self.cards.iter().map(CardController::state).collect()
    }

    /// Card that currently owns the audio tap.
    pub fn tap_owner(&self) -> Option<usize> {
        self.taps.owner()
    }

    pub fn analysis_disabled(&self) -> bool {
        self.taps.is_disabled()
    }

    /// Whether the host should schedule an animation frame.
    pub fn wants_frame(&self) -> bool {
        self.frames.is_pending()
    }

    pub fn is_turbo(&self) -> bool {
        self.turbo
    }

    pub fn user_interacted(&self) -> bool {
        self.user_interacted
    }

    pub fn autoplay(&self) -> bool {
        self.env.autoplay
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.env.autoplay = enabled;
    }

    pub fn now(&self) -> Duration {
        self.env.clock.now()
    }

    /// Notices queued since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<WallNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Activates the first card and prefetches its successor.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        tracing::info!(clips = self.cards.len(), "mounting video wall");
        self.apply_active(None);
        self.flush();
    }

    /// Stops sampling, drops timers, pauses the active card and abandons
    /// pending loads.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.frames.cancel();
        self.taps.detach();
        let active = self.env.feed.active();
        let mut ctx = self.env.ctx();
        self.cards[active].deactivate(&mut ctx);
        for card in &mut self.cards {
            card.suspend(&mut ctx);
        }
        self.env.timers.clear();
        tracing::info!("video wall unmounted");
        self.flush();
    }

    /// Routes one piece of user input.
    pub fn dispatch(&mut self, action: &UserAction) {
        match action {
            UserAction::Tap { card } => {
                let index = card.unwrap_or_else(|| self.active_index());
                self.tap_card(index);
            }
            UserAction::Swipe { from_y, to_y } => {
                self.touch_start(*from_y);
                self.touch_end(*to_y);
            }
            UserAction::Key { code } => self.key_down(code),
            UserAction::Navigate { direction } => self.advance(*direction),
            UserAction::JumpTo { index } => self.jump_to(*index),
        }
    }

    /// Forward/back navigation with its feedback pattern.
    pub fn advance(&mut self, direction: Direction) {
        if !self.mounted {
            return;
        }
        self.move_active(|feed| feed.advance(direction));
        self.env.haptics.emit(match direction {
            Direction::Forward => HapticEvent::Next,
            Direction::Backward => HapticEvent::Previous,
        });
        self.flush();
    }

    pub fn jump_to(&mut self, index: usize) {
        if !self.mounted {
            return;
        }
        self.move_active(|feed| feed.jump_to(index));
        self.flush();
    }

    /// Tap on a card: toggles the active one, or switches to another.
    pub fn tap_card(&mut self, index: usize) {
        if !self.mounted || index >= self.cards.len() {
            return;
        }
        self.register_interaction();
        if index == self.env.feed.active() {
            self.toggle_active();
        } else {
            self.move_active(|feed| feed.jump_to(index));
            self.env.haptics.emit(HapticEvent::CardSwitch);
        }
        self.sync_tap();
        self.flush();
    }

    pub fn touch_start(&mut self, y: f32) {
        self.register_interaction();
        self.swipe.touch_start(y);
        self.sync_tap();
        self.flush();
    }

    pub fn touch_end(&mut self, y: f32) {
        if let Some(direction) = self.swipe.touch_end(y) {
            self.advance(direction);
        }
    }

    pub fn key_down(&mut self, code: &str) {
        if self.keys.push(code) {
            self.turbo = !self.turbo;
            tracing::info!(enabled = self.turbo, "turbo mode toggled");
            self.env.haptics.emit(if self.turbo {
                HapticEvent::EasterEggOn
            } else {
                HapticEvent::EasterEggOff
            });
            self.notices.push(WallNotice::TurboMode {
                enabled: self.turbo,
            });
            self.flush();
            return;
        }

        match KeyCommand::from_code(code) {
            Some(KeyCommand::Navigate(direction)) => self.advance(direction),
            Some(KeyCommand::TogglePlayback) => {
                let active = self.env.feed.active();
                self.tap_card(active);
            }
            None => {}
        }
    }

    /// Forwards a media element event for card `index`.
    pub fn media_event(&mut self, index: usize, event: MediaEvent) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let mut ctx = self.env.ctx();
        card.handle_event(&mut ctx, event);
        self.sync_tap();
        self.flush();
    }

    /// Drains queued events from media elements that buffer them.
    pub fn pump(&mut self) {
        for index in 0..self.cards.len() {
            let events = self.cards[index].media_mut().drain_events();
            for event in events {
                self.media_event(index, event);
            }
        }
    }

    /// Moves the clock to `now` and fires due timers.
    pub fn advance_clock(&mut self, now: Duration) {
        self.env.clock.set(now);
        let due = self.env.timers.take_due(self.env.clock.now());
        for timer in due {
            match timer {
                CardTimer::LoadTimeout { card } => {
                    let mut ctx = self.env.ctx();
                    if let Some(card) = self.cards.get_mut(card) {
                        card.on_load_timeout(&mut ctx);
                    }
                }
                CardTimer::Advance { from } => self.auto_advance(from),
            }
        }
        self.sync_tap();
        self.flush();
    }

    /// Display refresh callback. Samples the audio tap when a frame was
    /// requested and the tapped card is still active and playing.
    pub fn animation_frame(&mut self, now: Duration) -> Option<LoudnessReading> {
        self.env.clock.set(now);
        if !self.frames.take() {
            return None;
        }

        let active = self.env.feed.active();
        let card = &self.cards[active];
        if self.taps.owner() != Some(active) || !card.is_active() || !card.is_playing() {
            self.taps.detach();
            return None;
        }

        let reading = self.taps.sample();
        if let Some(reading) = &reading {
            for event in &reading.events {
                self.env.haptics.emit(*event);
            }
            self.frames.request();
        }
        self.flush();
        reading
    }

    fn auto_advance(&mut self, from: usize) {
        if !self.mounted || !self.env.autoplay || self.env.feed.active() != from {
            tracing::debug!(from, "dropping stale auto-advance");
            return;
        }
        self.move_active(|feed| feed.advance(Direction::Forward));
        self.env.haptics.emit(HapticEvent::CardSwitch);
    }

    fn toggle_active(&mut self) {
        let active = self.env.feed.active();
        let mut ctx = self.env.ctx();
        self.cards[active].toggle_playback(&mut ctx);
    }

    fn register_interaction(&mut self) {
        if self.user_interacted {
            return;
        }
        self.user_interacted = true;
        self.env.autoplay = true;
        tracing::info!("first user interaction");
        self.env.haptics.emit(HapticEvent::Welcome);
    }

    fn move_active(&mut self, step: impl FnOnce(&mut FeedCoordinator) -> usize) {
        let previous = self.env.feed.active();
        let next = step(&mut self.env.feed);
        if next != previous {
            tracing::info!(from = previous, to = next, "active card changed");
        }
        self.apply_active(Some(previous));
    }

    /// Propagates the active index to every card: deactivates the previous
    /// card, activates the new one, prefetches its successor and evicts
    /// everything further away.
    fn apply_active(&mut self, previous: Option<usize>) {
        let active = self.env.feed.active();
        let len = self.cards.len();

        if let Some(previous) = previous.filter(|&previous| previous != active) {
            if self.taps.owner() == Some(previous) {
                self.taps.detach();
            }
            self.frames.cancel();
            let mut ctx = self.env.ctx();
            self.cards[previous].deactivate(&mut ctx);
            self.notices.push(WallNotice::ActiveChanged {
                from: previous,
                to: active,
            });
        }

        let mut ctx = self.env.ctx();
        if previous != Some(active) {
            self.cards[active].activate(&mut ctx);
        }
        for card in &mut self.cards {
            match residency(card.index(), active, len) {
                Residency::Prefetch => {
                    card.load_if_needed(&mut ctx);
                }
                Residency::Evicted => card.evict(&mut ctx),
                Residency::Active | Residency::Retained => {}
            }
        }

        self.sync_tap();
    }

    /// Keeps the audio tap in step with the active card: one tap while it is
    /// playing with decoded audio after the first interaction, none otherwise.
    fn sync_tap(&mut self) {
        let active = self.env.feed.active();
        let card = &self.cards[active];
        let wanted = self.mounted
            && self.user_interacted
            && card.is_active()
            && card.is_playing()
            && card.media().ready_state().has_current_data();

        if wanted {
            if self.taps.attach(active) && !self.frames.is_pending() {
                self.frames.request();
            }
        } else if self.taps.is_attached() {
            self.taps.detach();
            self.frames.cancel();
        }
    }

    fn flush(&mut self) {
        for pulse in self.env.haptics.drain_pulses() {
            self.notices.push(WallNotice::Pulse(pulse));
        }
        for (card, last) in self.cards.iter().zip(self.phases.iter_mut()) {
            let phase = card.phase();
            if *last != phase {
                *last = phase;
                self.notices.push(WallNotice::Phase {
                    card: card.index(),
                    phase,
                });
            }
        }
        for (card, last) in self.cards.iter().zip(self.progress.iter_mut()) {
            let fraction = card.progress();
            if *last != fraction {
                *last = fraction;
                self.notices.push(WallNotice::Progress {
                    card: card.index(),
                    fraction,
                });
            }
        }
    }
}

impl std::fmt::Debug for Wall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wall")
            .field("active", &self.env.feed.active())
            .field("cards", &self.cards.len())
            .field("taps", &self.taps)
            .field("haptics", &self.env.haptics)
            .field("turbo", &self.turbo)
            .field("user_interacted", &self.user_interacted)
            .field("mounted", &self.mounted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimulatedMedia, RecordingVibrator, SyntheticAnalyzer};

    struct Fixture {
        wall: Wall,
        media: Vec<SimulatedMedia>,
        vibrations: RecordingVibrator,
    }

    fn fixture(clips: usize) -> Fixture {
        let entries = (0..clips)
            .map(|n| ClipEntry::new(format!("clip_{n}.mp4"), "Test"))
            .collect();
        let catalog = Catalog::new(entries).unwrap();
        let media: Vec<_> = (0..clips).map(|_| SimulatedMedia::new(10.0)).collect();
        let vibrations = RecordingVibrator::default();
        let handles = media.clone();
        let wall = Wall::new(AppConfig::default(), catalog, |index, _| {
            Box::new(handles[index].clone())
        })
        .unwrap()
        .with_vibrator(Box::new(vibrations.clone()))
        .with_analyzer(Box::new(SyntheticAnalyzer::new(7)));
        Fixture {
            wall,
            media,
            vibrations,
        }
    }

    fn make_ready(fixture: &mut Fixture) {
        for media in &fixture.media {
            media.advance(Duration::from_millis(1));
        }
        fixture.wall.pump();
    }

    fn pulses(notices: &[WallNotice]) -> Vec<HapticEvent> {
        notices
            .iter()
            .filter_map(|notice| match notice {
                WallNotice::Pulse(pulse) => Some(pulse.event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mount_activates_first_and_prefetches_second() {
        let mut fx = fixture(5);
        fx.wall.mount();

        let states = fx.wall.card_states();
        assert!(states[0].active);
        assert_eq!(states[0].phase, CardPhase::Loading);
        assert_eq!(states[1].phase, CardPhase::Loading);
        assert!(states[2..].iter().all(|state| state.phase == CardPhase::Idle));
    }

    #[test]
    fn at_most_one_active_card_while_navigating() {
        let mut fx = fixture(6);
        fx.wall.mount();
        make_ready(&mut fx);

        for step in 0..20 {
            let direction = if step % 3 == 0 {
                Direction::Backward
            } else {
                Direction::Forward
            };
            fx.wall.advance(direction);
            make_ready(&mut fx);
            let active: Vec<_> = fx
                .wall
                .card_states()
                .iter()
                .enumerate()
                .filter(|(_, state)| state.active)
                .map(|(index, _)| index)
                .collect();
            assert_eq!(active, vec![fx.wall.active_index()]);
            let playing = fx.media.iter().filter(|media| !media.is_paused()).count();
            assert!(playing <= 1);
        }
    }

    #[test]
    fn far_cards_are_evicted() {
        let mut fx = fixture(6);
        fx.wall.mount();
        make_ready(&mut fx);
        fx.wall.jump_to(3);
        make_ready(&mut fx);

        let states = fx.wall.card_states();
        assert_eq!(states[0].phase, CardPhase::Idle);
        assert!(!fx.media[0].has_source());
        assert_eq!(states[1].phase, CardPhase::Idle);
        assert_eq!(states[3].phase, CardPhase::Playing);
        assert!(states[4].loaded);
    }

    #[test]
    fn navigation_emits_direction_feedback() {
        let mut fx = fixture(3);
        fx.wall.mount();
        fx.wall.drain_notices();

        fx.wall.advance(Direction::Forward);
        let notices = fx.wall.drain_notices();
        assert!(notices.contains(&WallNotice::ActiveChanged { from: 0, to: 1 }));
        assert_eq!(pulses(&notices).last(), Some(&HapticEvent::Next));

        fx.wall.advance(Direction::Backward);
        let notices = fx.wall.drain_notices();
        assert_eq!(pulses(&notices).last(), Some(&HapticEvent::Previous));
        assert_eq!(fx.vibrations.patterns().last(), Some(&vec![80, 40, 120]));
    }

    #[test]
    fn ended_card_advances_after_delay() {
        let mut fx = fixture(3);
        fx.wall.mount();
        make_ready(&mut fx);
        assert!(fx.wall.card_state(0).unwrap().playing);

        fx.wall.advance_clock(Duration::from_secs(10));
        fx.wall.media_event(0, MediaEvent::Ended);
        fx.wall.advance_clock(Duration::from_millis(10_499));
        assert_eq!(fx.wall.active_index(), 0);

        fx.wall.drain_notices();
        fx.wall.advance_clock(Duration::from_millis(10_500));
        assert_eq!(fx.wall.active_index(), 1);
        let notices = fx.wall.drain_notices();
        assert_eq!(pulses(&notices).last(), Some(&HapticEvent::CardSwitch));
    }

    #[test]
    fn stale_auto_advance_is_dropped() {
        let mut fx = fixture(4);
        fx.wall.mount();
        make_ready(&mut fx);
        fx.wall.media_event(0, MediaEvent::Ended);
        fx.wall.jump_to(2);
        fx.wall.advance_clock(Duration::from_secs(1));
        assert_eq!(fx.wall.active_index(), 2);
    }

    #[test]
    fn tap_is_created_after_interaction_and_dropped_on_pause() {
        let mut fx = fixture(3);
        fx.wall.mount();
        make_ready(&mut fx);
        assert_eq!(fx.wall.tap_owner(), None);

        fx.wall.touch_start(100.0);
        fx.wall.touch_end(100.0);
        assert_eq!(fx.wall.tap_owner(), Some(0));
        assert!(fx.wall.wants_frame());
        assert!(fx.wall.animation_frame(Duration::from_millis(16)).is_some());

        fx.wall.tap_card(0);
        assert_eq!(fx.wall.card_state(0).unwrap().phase, CardPhase::Paused);
        assert_eq!(fx.wall.tap_owner(), None);
        assert!(!fx.wall.wants_frame());
        assert!(fx.wall.animation_frame(Duration::from_millis(32)).is_none());
    }

    #[test]
    fn tap_moves_with_the_active_card() {
        let mut fx = fixture(3);
        fx.wall.mount();
        make_ready(&mut fx);
        fx.wall.tap_card(1);
        make_ready(&mut fx);

        assert_eq!(fx.wall.active_index(), 1);
        assert_eq!(fx.wall.tap_owner(), Some(1));
        assert!(fx.media[0].is_paused());
    }

    #[test]
    fn unmount_cancels_sampling() {
        let mut fx = fixture(3);
        fx.wall.mount();
        make_ready(&mut fx);
        fx.wall.touch_start(0.0);
        assert!(fx.wall.wants_frame());

        fx.wall.unmount();
        assert!(!fx.wall.wants_frame());
        assert_eq!(fx.wall.tap_owner(), None);
        assert!(fx.media[0].is_paused());
    }

    #[test]
    fn remount_rearms_the_load_timeout() {
        let mut fx = fixture(3);
        let _stalled = fx.media[0].clone().never_ready();
        fx.wall.mount();
        fx.wall.unmount();
        assert_eq!(fx.wall.card_state(0).unwrap().phase, CardPhase::Idle);
        assert!(!fx.media[0].has_source());

        fx.wall.mount();
        fx.wall.advance_clock(Duration::from_secs(60));
        let state = fx.wall.card_state(0).unwrap();
        assert_eq!(state.phase, CardPhase::Errored);
        assert_eq!(state.fault, Some(crate::PlaybackFault::LoadTimeout));
        assert!(state.shows_retry());
    }

    #[test]
    fn progress_is_published_and_reset_on_end() {
        let mut fx = fixture(3);
        fx.wall.mount();
        make_ready(&mut fx);
        fx.wall.drain_notices();

        let mut published = Vec::new();
        for _ in 0..105 {
            fx.media[0].advance(Duration::from_millis(100));
            fx.wall.pump();
            published.extend(fx.wall.drain_notices().into_iter().filter_map(
                |notice| match notice {
                    WallNotice::Progress { card: 0, fraction } => Some(fraction),
                    _ => None,
                },
            ));
        }

        assert!(published.iter().any(|fraction| (0.4..0.6).contains(fraction)));
        assert!(published.contains(&1.0));
        assert_eq!(published.last(), Some(&0.0));
        assert_eq!(fx.wall.card_state(0).unwrap().progress, 0.0);
    }

    #[test]
    fn cheat_code_toggles_turbo_mode() {
        let mut fx = fixture(3);
        fx.wall.mount();
        for code in crate::CHEAT_CODE {
            fx.wall.key_down(code);
        }
        assert!(fx.wall.is_turbo());
        assert_eq!(fx.wall.active_index(), 0);
        let notices = fx.wall.drain_notices();
        assert!(notices.contains(&WallNotice::TurboMode { enabled: true }));
        assert_eq!(pulses(&notices).last(), Some(&HapticEvent::EasterEggOn));

        for code in crate::CHEAT_CODE {
            fx.wall.key_down(code);
        }
        assert!(!fx.wall.is_turbo());
    }

    #[test]
    fn first_interaction_says_welcome_once() {
        let mut fx = fixture(3);
        fx.wall.mount();
        fx.wall.drain_notices();
        fx.wall.touch_start(0.0);
        fx.wall.touch_start(0.0);
        let welcomes = pulses(&fx.wall.drain_notices())
            .into_iter()
            .filter(|event| *event == HapticEvent::Welcome)
            .count();
        assert_eq!(welcomes, 1);
    }

    #[test]
    fn swipe_up_moves_forward() {
        let mut fx = fixture(3);
        fx.wall.mount();
        fx.wall.dispatch(&UserAction::Swipe {
            from_y: 500.0,
            to_y: 380.0,
        });
        assert_eq!(fx.wall.active_index(), 1);
        fx.wall.dispatch(&UserAction::Swipe {
            from_y: 380.0,
            to_y: 500.0,
        });
        assert_eq!(fx.wall.active_index(), 0);
    }

    #[test]
    fn rejects_mismatched_configuration() {
        let mut config = AppConfig::default();
        config.analyzer.fft_size = 31;
        let result = Wall::new(config, Catalog::builtin(), |_, _| {
            Box::new(SimulatedMedia::new(1.0))
        });
        assert!(result.is_err());
    }
}

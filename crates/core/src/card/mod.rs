//! Per-clip playback and lifecycle controller.
//!
//! A card moves through `idle -> loading -> ready <-> playing/paused`, with a
//! parallel `errored` state reachable from loading or playback. The only way
//! out of `errored` is [`CardController::toggle_playback`], which retries.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    media::progress_of, residency, ClipEntry, HapticEvent, Haptics, MediaElement, MediaEvent,
    PlaybackConfig, PlaybackFault, Residency, Scheduler, TimerId,
};

/// Timers the cards arm on the shared scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardTimer {
    /// Card `card` has been loading for the full timeout.
    LoadTimeout { card: usize },
    /// Card `from` ended naturally and wants the feed to move on.
    Advance { from: usize },
}

/// Lifecycle phase of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardPhase {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Errored,
}

impl CardPhase {
    pub fn is_playable(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }
}

/// Why playback should start once the clip becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingStart {
    None,
    Autoplay,
    Toggle,
}

/// Snapshot of a card's flags, as rendered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    pub phase: CardPhase,
    pub active: bool,
    pub loaded: bool,
    pub playable: bool,
    pub errored: bool,
    pub playing: bool,
    pub load_attempted: bool,
    pub progress: f32,
    pub fault: Option<PlaybackFault>,
}

impl CardState {
    /// Whether the host should offer a retry affordance.
    pub fn shows_retry(&self) -> bool {
        self.errored && self.active
    }
}

/// Everything a card may touch while handling one event.
pub struct CardContext<'a> {
    pub now: Duration,
    pub active: usize,
    pub len: usize,
    pub autoplay: bool,
    pub playback: &'a PlaybackConfig,
    pub haptics: &'a mut Haptics,
    pub timers: &'a mut Scheduler<CardTimer>,
}

pub struct CardController {
    index: usize,
    clip: ClipEntry,
    media: Box<dyn MediaElement>,
    phase: CardPhase,
    active: bool,
    load_attempted: bool,
    pending: PendingStart,
    progress: f32,
    fault: Option<PlaybackFault>,
    load_timer: Option<TimerId>,
}

impl CardController {
    pub fn new(index: usize, clip: ClipEntry, media: Box<dyn MediaElement>) -> Self {
        Self {
            index,
            clip,
            media,
            phase: CardPhase::Idle,
            active: false,
            load_attempted: false,
            pending: PendingStart::None,
            progress: 0.0,
            fault: None,
            load_timer: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn clip(&self) -> &ClipEntry {
        &self.clip
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_playing(&self) -> bool {
        self.phase == CardPhase::Playing
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn media(&self) -> &dyn MediaElement {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> &mut dyn MediaElement {
        self.media.as_mut()
    }

    pub fn state(&self) -> CardState {
        CardState {
            phase: self.phase,
            active: self.active,
            loaded: self.phase != CardPhase::Idle,
            playable: self.phase.is_playable(),
            errored: self.phase == CardPhase::Errored,
            playing: self.is_playing(),
            load_attempted: self.load_attempted,
            progress: self.progress,
            fault: self.fault,
        }
    }

    /// Starts fetching the clip when this card is active or next in line.
    /// Fires at most once per activation cycle. Returns whether a load began.
    pub fn load_if_needed(&mut self, ctx: &mut CardContext<'_>) -> bool {
        if self.load_attempted || self.phase != CardPhase::Idle {
            return false;
        }
        if !matches!(
            residency(self.index, ctx.active, ctx.len),
            Residency::Active | Residency::Prefetch
        ) {
            return false;
        }

        self.load_attempted = true;
        self.phase = CardPhase::Loading;
        self.media.load(&self.clip.src);
        self.cancel_load_timer(ctx);
        self.load_timer = Some(ctx.timers.schedule_after(
            ctx.now,
            ctx.playback.load_timeout(),
            CardTimer::LoadTimeout { card: self.index },
        ));
        tracing::debug!(card = self.index, src = %self.clip.src, "loading clip");
        true
    }

    /// Makes this the visible card: loads it, rewinds it and, with autoplay,
    /// starts it.
    pub fn activate(&mut self, ctx: &mut CardContext<'_>) {
        self.active = true;
        ctx.haptics.emit(HapticEvent::CardActivate);
        self.load_if_needed(ctx);

        if self.phase.is_playable() {
            self.media.set_current_time(0.0);
            self.progress = 0.0;
        }

        if ctx.autoplay {
            if self.phase.is_playable() {
                self.start(ctx, PendingStart::Autoplay);
            } else if self.phase == CardPhase::Loading {
                self.pending = PendingStart::Autoplay;
            }
        }
    }

    /// Hides this card and stops its playback.
    pub fn deactivate(&mut self, _ctx: &mut CardContext<'_>) {
        self.active = false;
        self.pending = PendingStart::None;
        if self.phase == CardPhase::Playing || !self.media.is_paused() {
            self.media.pause();
        }
        if self.phase == CardPhase::Playing {
            self.phase = CardPhase::Paused;
        }
    }

    /// User tap on the active card. Retries when errored, defers once when
    /// the clip is not ready yet, and otherwise flips play/pause.
    pub fn toggle_playback(&mut self, ctx: &mut CardContext<'_>) {
        match self.phase {
            CardPhase::Errored => self.retry(ctx),
            CardPhase::Idle | CardPhase::Loading => {
                self.load_if_needed(ctx);
                if self.pending != PendingStart::Toggle {
                    self.pending = PendingStart::Toggle;
                } else {
                    // A second tap before the clip is ready cancels the
                    // deferred toggle.
                    self.pending = PendingStart::None;
                }
            }
            CardPhase::Ready | CardPhase::Paused => self.start(ctx, PendingStart::Toggle),
            CardPhase::Playing => {
                self.media.pause();
                self.phase = CardPhase::Paused;
            }
        }
    }

    /// Clears the error and restarts loading. Only reachable from a user tap.
    fn retry(&mut self, ctx: &mut CardContext<'_>) {
        tracing::info!(card = self.index, "retrying clip after failure");
        self.fault = None;
        self.phase = CardPhase::Idle;
        self.load_attempted = false;
        self.media.unload();
        if self.load_if_needed(ctx) && ctx.autoplay {
            self.pending = PendingStart::Autoplay;
        }
    }

    /// Releases the clip's resources because it is far from the active card.
    /// Errored cards keep their error so that only a retry clears it.
    pub fn evict(&mut self, ctx: &mut CardContext<'_>) {
        if self.phase == CardPhase::Idle && !self.load_attempted {
            return;
        }
        self.cancel_load_timer(ctx);
        self.media.unload();
        self.pending = PendingStart::None;
        self.progress = 0.0;
        self.load_attempted = false;
        if self.phase != CardPhase::Errored {
            self.phase = CardPhase::Idle;
        }
        tracing::debug!(card = self.index, "evicted clip");
    }

    /// Drops timers and any half-finished load before the wall goes away, so
    /// that a later activation starts the load and its timeout afresh.
    pub fn suspend(&mut self, ctx: &mut CardContext<'_>) {
        self.cancel_load_timer(ctx);
        self.pending = PendingStart::None;
        if self.phase == CardPhase::Loading {
            self.media.unload();
            self.phase = CardPhase::Idle;
            self.load_attempted = false;
            tracing::debug!(card = self.index, "abandoned pending load");
        }
    }

    /// The load timeout for this card expired.
    pub fn on_load_timeout(&mut self, ctx: &mut CardContext<'_>) {
        self.load_timer = None;
        if self.phase == CardPhase::Loading {
            self.fail(ctx, PlaybackFault::LoadTimeout);
        }
    }

    /// Feeds one media element event through the state machine.
    pub fn handle_event(&mut self, ctx: &mut CardContext<'_>, event: MediaEvent) {
        match event {
            MediaEvent::LoadStart => {
                if self.phase == CardPhase::Idle {
                    self.phase = CardPhase::Loading;
                }
            }
            MediaEvent::LoadedData | MediaEvent::CanPlay => {
                if self.phase != CardPhase::Loading {
                    return;
                }
                self.cancel_load_timer(ctx);
                self.phase = CardPhase::Ready;
                tracing::debug!(card = self.index, "clip ready");

                let pending = std::mem::replace(&mut self.pending, PendingStart::None);
                if self.active && pending != PendingStart::None {
                    self.start(ctx, pending);
                }
            }
            MediaEvent::Play => {
                if self.phase == CardPhase::Errored {
                    return;
                }
                if !self.active {
                    // Only the active card may play.
                    self.media.pause();
                    return;
                }
                self.phase = CardPhase::Playing;
                ctx.haptics.emit(HapticEvent::Play);
            }
            MediaEvent::Pause => {
                if self.phase == CardPhase::Playing {
                    self.phase = CardPhase::Paused;
                }
                if self.active && self.phase != CardPhase::Errored {
                    ctx.haptics.emit(HapticEvent::Pause);
                }
            }
            MediaEvent::Ended => self.on_ended(ctx),
            MediaEvent::TimeUpdate => {
                self.progress = progress_of(self.media.current_time(), self.media.duration());
            }
            MediaEvent::Error => self.fail(ctx, PlaybackFault::DecodeOrPlayback),
        }
    }

    fn on_ended(&mut self, ctx: &mut CardContext<'_>) {
        if self.phase == CardPhase::Errored {
            return;
        }
        self.progress = 0.0;
        if self.phase == CardPhase::Playing {
            self.phase = CardPhase::Paused;
        }
        if !self.active {
            return;
        }

        ctx.haptics.emit(HapticEvent::End);
        if ctx.autoplay {
            ctx.timers.schedule_after(
                ctx.now,
                ctx.playback.advance_delay(),
                CardTimer::Advance { from: self.index },
            );
        }
    }

    fn start(&mut self, ctx: &mut CardContext<'_>, reason: PendingStart) {
        match self.media.play() {
            Ok(()) => self.phase = CardPhase::Playing,
            Err(fault) if fault.is_fatal_for_card() => self.fail(ctx, fault),
            Err(fault) => {
                tracing::warn!(card = self.index, ?reason, %fault, "playback refused by host");
                ctx.haptics.emit(HapticEvent::Warning);
            }
        }
    }

    fn fail(&mut self, ctx: &mut CardContext<'_>, fault: PlaybackFault) {
        tracing::warn!(card = self.index, src = %self.clip.src, %fault, "clip failed");
        self.cancel_load_timer(ctx);
        self.phase = CardPhase::Errored;
        self.fault = Some(fault);
        self.pending = PendingStart::None;
        if !self.media.is_paused() {
            self.media.pause();
        }
        if self.active {
            ctx.haptics.emit(HapticEvent::Error);
        }
    }

    fn cancel_load_timer(&mut self, ctx: &mut CardContext<'_>) {
        if let Some(id) = self.load_timer.take() {
            ctx.timers.cancel(id);
        }
    }
}

impl fmt::Debug for CardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardController")
            .field("index", &self.index)
            .field("clip", &self.clip)
            .field("phase", &self.phase)
            .field("active", &self.active)
            .field("load_attempted", &self.load_attempted)
            .field("pending", &self.pending)
            .field("progress", &self.progress)
            .finish()
    }
}

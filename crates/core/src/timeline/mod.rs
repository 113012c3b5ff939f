use std::time::Duration;

/// Monotonic clock advanced explicitly by the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostClock {
    now: Duration,
}

impl HostClock {
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock to `now`. Time never runs backwards.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn advance(&mut self, delta: Duration) {
        self.now = self.now.saturating_add(delta);
    }
}

/// Handle used to cancel a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct ScheduledEvent<T> {
    due: Duration,
    id: TimerId,
    action: T,
}

/// One-shot timers keyed by monotonic time.
#[derive(Debug)]
pub struct Scheduler<T> {
    events: Vec<ScheduledEvent<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, due: Duration, action: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        // Keep events sorted by (due, id) so firing order is insertion order
        // for equal deadlines.
        let position = self.events.partition_point(|event| event.due <= due);
        self.events.insert(position, ScheduledEvent { due, id, action });
        id
    }

    pub fn schedule_after(&mut self, now: Duration, delay: Duration, action: T) -> TimerId {
        self.schedule_at(now.saturating_add(delay), action)
    }

    /// Cancels a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.events.iter().position(|event| event.id == id) {
            Some(index) => {
                self.events.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.events.iter().any(|event| event.id == id)
    }

    /// Removes and returns every action whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let split = self.events.partition_point(|event| event.due <= now);
        self.events.drain(..split).map(|event| event.action).collect()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.events.first().map(|event| event.due)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// A single outstanding "call me on the next display refresh" request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnimationLoop {
    pending: bool,
    frames: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes the pending request for this frame. The callback must call
    /// [`AnimationLoop::request`] again to keep the loop alive.
    pub fn take(&mut self) -> bool {
        let pending = std::mem::take(&mut self.pending);
        if pending {
            self.frames += 1;
        }
        pending
    }

    /// Number of frames delivered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

//! Gesture and keyboard interpretation.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Key codes that toggle turbo mode when typed in order.
pub const CHEAT_CODE: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "KeyB",
    "KeyA",
];

/// Turns a vertical touch start/end pair into a navigation direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeTracker {
    threshold: f32,
    start_y: Option<f32>,
}

impl SwipeTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            start_y: None,
        }
    }

    pub fn touch_start(&mut self, y: f32) {
        self.start_y = Some(y);
    }

    /// Finishes a gesture. Dragging up past the threshold moves forward,
    /// dragging down moves backward; shorter drags are taps.
    pub fn touch_end(&mut self, y: f32) -> Option<Direction> {
        let start = self.start_y.take()?;
        if start - y > self.threshold {
            Some(Direction::Forward)
        } else if y - start > self.threshold {
            Some(Direction::Backward)
        } else {
            None
        }
    }
}

/// Detects a fixed key sequence typed without interruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence {
    sequence: Vec<String>,
    position: usize,
}

impl KeySequence {
    pub fn new<I, S>(sequence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sequence: sequence.into_iter().map(Into::into).collect(),
            position: 0,
        }
    }

    pub fn cheat_code() -> Self {
        Self::new(CHEAT_CODE)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Feeds one key. Returns `true` when the sequence has just completed.
    pub fn push(&mut self, code: &str) -> bool {
        if self.sequence.is_empty() {
            return false;
        }

        if self.sequence[self.position] == code {
            self.position += 1;
        } else {
            // A wrong key may itself start a new attempt.
            self.position = usize::from(self.sequence[0] == code);
        }

        if self.position == self.sequence.len() {
            self.position = 0;
            true
        } else {
            false
        }
    }
}

/// Keyboard commands outside the cheat code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCommand {
    Navigate(Direction),
    TogglePlayback,
}

impl KeyCommand {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PageDown" | "KeyJ" => Some(Self::Navigate(Direction::Forward)),
            "PageUp" | "KeyK" => Some(Self::Navigate(Direction::Backward)),
            "Space" => Some(Self::TogglePlayback),
            _ => None,
        }
    }
}

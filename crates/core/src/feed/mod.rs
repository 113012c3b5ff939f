use serde::{Deserialize, Serialize};

/// Navigation direction through the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Owner of the active index. Every other component only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCoordinator {
    active: usize,
    len: usize,
}

impl FeedCoordinator {
    /// A feed over `len` clips starting at the first one. `len` is at least
    /// one; callers build it from a non-empty catalog.
    pub fn new(len: usize) -> Self {
        Self {
            active: 0,
            len: len.max(1),
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Moves one step, wrapping around both ends. Returns the new index.
    pub fn advance(&mut self, direction: Direction) -> usize {
        self.active = match direction {
            Direction::Forward => (self.active + 1) % self.len,
            Direction::Backward => (self.active + self.len - 1) % self.len,
        };
        self.active
    }

    /// Jumps to `index`, taken modulo the feed length.
    pub fn jump_to(&mut self, index: usize) -> usize {
        self.active = index % self.len;
        self.active
    }

    /// The index that follows `index`, wrapping.
    pub fn successor(&self, index: usize) -> usize {
        (index + 1) % self.len
    }
}

/// What a card should hold given its distance from the active card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Residency {
    /// The active card itself.
    Active,
    /// The card right after the active one; loaded ahead of time.
    Prefetch,
    /// The card right before the active one; kept if loaded, never fetched.
    Retained,
    /// Further away in both directions; resources are released.
    Evicted,
}

/// Residency of card `index` when `active` is the active index in a feed of
/// `len` clips. Distance is measured around the ring.
pub fn residency(index: usize, active: usize, len: usize) -> Residency {
    let len = len.max(1);
    let (index, active) = (index % len, active % len);
    if index == active {
        Residency::Active
    } else if index == (active + 1) % len {
        Residency::Prefetch
    } else if (index + 1) % len == active {
        Residency::Retained
    } else {
        Residency::Evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_wrap_around() {
        for len in 1..8 {
            for start in 0..len {
                let mut feed = FeedCoordinator::new(len);
                feed.jump_to(start);
                for _ in 0..len {
                    feed.advance(Direction::Forward);
                }
                assert_eq!(feed.active(), start);
                for _ in 0..len {
                    feed.advance(Direction::Backward);
                }
                assert_eq!(feed.active(), start);
            }
        }
    }

    #[test]
    fn three_clip_scenario() {
        let mut feed = FeedCoordinator::new(3);
        assert_eq!(feed.advance(Direction::Forward), 1);
        assert_eq!(feed.advance(Direction::Forward), 2);
        assert_eq!(feed.advance(Direction::Forward), 0);
        assert_eq!(feed.advance(Direction::Backward), 2);
    }

    #[test]
    fn jump_is_taken_modulo_length() {
        let mut feed = FeedCoordinator::new(4);
        assert_eq!(feed.jump_to(9), 1);
        assert_eq!(feed.successor(3), 0);
    }

    #[test]
    fn residency_by_ring_distance() {
        assert_eq!(residency(3, 3, 10), Residency::Active);
        assert_eq!(residency(4, 3, 10), Residency::Prefetch);
        assert_eq!(residency(2, 3, 10), Residency::Retained);
        assert_eq!(residency(5, 3, 10), Residency::Evicted);
        assert_eq!(residency(0, 9, 10), Residency::Prefetch);
        assert_eq!(residency(9, 0, 10), Residency::Retained);
    }

    #[test]
    fn small_feeds_never_evict() {
        for active in 0..3 {
            for index in 0..3 {
                assert_ne!(residency(index, active, 3), Residency::Evicted);
            }
        }
        assert_eq!(residency(1, 0, 2), Residency::Prefetch);
        assert_eq!(residency(0, 0, 1), Residency::Active);
    }
}

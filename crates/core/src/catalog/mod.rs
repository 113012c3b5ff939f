use std::path::Path;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Result, VideoWallError};

const BUILTIN_CLIPS: u32 = 65;

/// One playable clip: where to fetch it from and the label shown on its card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipEntry {
    pub src: String,
    pub label: String,
}

impl ClipEntry {
    pub fn new(src: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            label: label.into(),
        }
    }
}

/// Immutable, session-lived ordered list of clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<ClipEntry>,
}

impl Catalog {
    /// Builds a catalog in the given order. Empty catalogs are rejected since
    /// every index computation is taken modulo the length.
    pub fn new(entries: Vec<ClipEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(VideoWallError::InvalidCatalog(
                "catalog needs at least one clip".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// The clips bundled with the application, in their authored order.
    pub fn builtin() -> Self {
        Self {
            entries: (1..=BUILTIN_CLIPS)
                .map(|n| ClipEntry::new(format!("BMW_{n}.mp4"), "BMW"))
                .collect(),
        }
    }

    /// Reads a JSON array of `{ "src": ..., "label": ... }` objects.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let entries: Vec<ClipEntry> = serde_json::from_str(&text)?;
        Self::new(entries)
    }

    /// Returns a copy permuted with an unbiased Fisher-Yates shuffle.
    pub fn shuffled_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut entries = self.entries.clone();
        entries.shuffle(rng);
        Self { entries }
    }

    /// Shuffles deterministically when a seed is given, otherwise from the
    /// thread-local generator.
    pub fn shuffled(&self, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => self.shuffled_with(&mut StdRng::seed_from_u64(seed)),
            None => self.shuffled_with(&mut rand::thread_rng()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClipEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ClipEntry] {
        &self.entries
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PacingError, Result};

/// Phrases spoken when no default set is configured.
pub const DEFAULT_FILLERS: [&str; 4] = ["hum...", "you know...", "let me think...", "so, "];

/// Non-empty set of placeholder phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillerSet {
    phrases: Vec<String>,
}

impl FillerSet {
    /// Builds a set from `phrases`, failing when none are given.
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        if phrases.is_empty() {
            return Err(PacingError::EmptyFillerSet);
        }
        Ok(Self { phrases })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// A `FillerSet` is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.iter().any(|p| p == phrase)
    }

    /// Picks one phrase using `chooser`.
    pub fn choose(&self, chooser: &mut dyn FillerChooser) -> &str {
        let idx = chooser.choose_index(self.phrases.len());
        // A misbehaving chooser still lands inside the set.
        &self.phrases[idx % self.phrases.len()]
    }
}

impl Default for FillerSet {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_FILLERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Strategy selecting which filler to speak.
pub trait FillerChooser: Send {
    /// Returns an index in `0..count`. `count` is never zero.
    fn choose_index(&mut self, count: usize) -> usize;
}

/// Uniform random choice backed by [`StdRng`].
pub struct RandomChooser {
    rng: StdRng,
}

impl RandomChooser {
    /// Chooser seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible chooser.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl FillerChooser for RandomChooser {
    fn choose_index(&mut self, count: usize) -> usize {
        self.rng.gen_range(0..count)
    }
}

/// Walks the filler set in order, wrapping around.
#[derive(Debug, Default)]
pub struct SequentialChooser {
    next: usize,
}

impl FillerChooser for SequentialChooser {
    fn choose_index(&mut self, count: usize) -> usize {
        let idx = self.next % count;
        self.next = self.next.wrapping_add(1);
        idx
    }
}

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::filler::{DEFAULT_FILLERS, FillerSet};
use crate::{EngineConfig, LagSchedule};

/// Text spoken when no other input is configured.
pub const DEMO_TEXT: &str = "Pragmatic Thinking and Learning: Refactor Your Wetware is a book \
written by Andy Hunt, one of the co-authors of the famous book The Pragmatic Programmer. The \
book explores the nature of thinking and how we learn, providing practical techniques to help \
readers become better thinkers and learners.";

/// Stalls applied to [`DEMO_TEXT`], in milliseconds.
pub const DEMO_LAG: [(usize, u64); 10] = [
    (1, 1000),
    (3, 2000),
    (7, 2000),
    (13, 3000),
    (16, 3000),
    (20, 3000),
    (25, 3000),
    (29, 3000),
    (33, 3000),
    (40, 3000),
];

/// Settings for a pacing run, usually read from a TOML file.
///
/// Every field is optional in the file; missing ones fall back to the demo
/// defaults.
///
/// ```toml
/// text = "a b c"
/// lag = [[1, 100]]
/// speaking_interval_ms = 250
/// fillers = ["um...", "uh..."]
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub text: String,
    pub lag: LagSchedule,
    pub speaking_interval_ms: u64,
    /// Accepted but inert; see [`EngineConfig::check_interval`].
    pub check_interval_ms: u64,
    pub lag_threshold_ms: u64,
    pub fillers: Vec<String>,
    /// Seed for filler selection; random when absent.
    pub seed: Option<u64>,
    /// Viewport width override.
    pub width: Option<u16>,
    /// Viewport height override.
    pub height: Option<u16>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            text: DEMO_TEXT.to_string(),
            lag: DEMO_LAG.into_iter().collect(),
            speaking_interval_ms: 500,
            check_interval_ms: 5000,
            lag_threshold_ms: 1000,
            fillers: DEFAULT_FILLERS.iter().map(|f| f.to_string()).collect(),
            seed: None,
            width: None,
            height: None,
        }
    }
}

impl PacingConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            speaking_interval: Duration::from_millis(self.speaking_interval_ms),
            check_interval: Duration::from_millis(self.check_interval_ms),
            lag_threshold: Duration::from_millis(self.lag_threshold_ms),
        }
    }

    /// Filler phrases as a validated set.
    pub fn filler_set(&self) -> Result<FillerSet> {
        FillerSet::new(self.fillers.iter().cloned())
    }
}

/// Load a [`PacingConfig`] from a TOML file.
///
/// # Examples
///
/// ```no_run
/// use cadence_rs::config::load;
/// # tokio_test::block_on(async {
/// let cfg = load("cadence.toml").await.unwrap();
/// println!("{} lag entries", cfg.lag.len());
/// # });
/// ```
pub async fn load<P: AsRef<Path>>(path: P) -> Result<PacingConfig> {
    let text = tokio::fs::read_to_string(path).await?;
    PacingConfig::from_toml(&text)
}

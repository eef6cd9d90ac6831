//! Smooth a lagging, bursty token feed into steadily paced speech.
//!
//! A [`LaggedTokenSource`] replays text with simulated stalls. An
//! [`AdaptivePacingEngine`] drains it in the background and re-emits tokens
//! at a fixed speaking interval, filling silences with phrases from a
//! [`FillerSet`]. The [`renderer`] and [`screen`] modules draw the result.

pub mod config;
mod engine;
mod error;
mod filler;
mod lag_schedule;
pub mod logger;
pub mod renderer;
pub mod screen;
mod source;
mod stats;

pub use config::PacingConfig;
pub use engine::{AdaptivePacingEngine, DrainHandle, EngineConfig, Utterance};
pub use error::{PacingError, Result};
pub use filler::{DEFAULT_FILLERS, FillerChooser, FillerSet, RandomChooser, SequentialChooser};
pub use lag_schedule::LagSchedule;
pub use renderer::{RenderSummary, TranscriptRenderer, render_stream};
pub use screen::{AnsiScreen, BufferScreen, Screen, Style};
pub use source::{BlockingTokens, LaggedTokenSource, TokenSource, tokenize};
pub use stats::StatsSnapshot;

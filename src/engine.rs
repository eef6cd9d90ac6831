//! Adaptive pacing of a lagging token source.
//!
//! [`AdaptivePacingEngine::spawn`] starts a background drain task that moves
//! tokens from a [`TokenSource`] into a FIFO channel as fast as they arrive.
//! The engine itself hands out one [`Utterance`] per call at a constant
//! cadence, speaking a filler phrase whenever the channel is empty and the
//! source has not finished yet.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{Instrument, debug, debug_span, trace};

use crate::filler::{FillerChooser, FillerSet};
use crate::source::TokenSource;
use crate::stats::{Counters, StatsSnapshot};

/// One item of paced output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// A real token taken from the source.
    Token(String),
    /// A placeholder spoken while the source lagged.
    Filler(String),
}

impl Utterance {
    pub fn as_str(&self) -> &str {
        match self {
            Utterance::Token(t) | Utterance::Filler(t) => t,
        }
    }

    pub fn is_filler(&self) -> bool {
        matches!(self, Utterance::Filler(_))
    }

    /// The token text, or `None` for fillers.
    pub fn token(&self) -> Option<&str> {
        match self {
            Utterance::Token(t) => Some(t),
            Utterance::Filler(_) => None,
        }
    }
}

impl AsRef<str> for Utterance {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing knobs for [`AdaptivePacingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Gap applied after every utterance, real or filler.
    pub speaking_interval: Duration,
    /// Accepted for compatibility with rate checking; currently has no effect.
    pub check_interval: Duration,
    /// Arrival gaps at least this long are logged and counted as lag events.
    pub lag_threshold: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speaking_interval: Duration::from_millis(300),
            check_interval: Duration::from_secs(10),
            lag_threshold: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn speaking_interval(mut self, interval: Duration) -> Self {
        self.speaking_interval = interval;
        self
    }

    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn lag_threshold(mut self, threshold: Duration) -> Self {
        self.lag_threshold = threshold;
        self
    }
}

#[derive(Debug, Default)]
struct EngineState {
    finished: AtomicBool,
    counters: Counters,
}

/// Re-emits tokens from a lagging source at a steady pace.
///
/// # Example
///
/// ```
/// use cadence_rs::{
///     AdaptivePacingEngine, EngineConfig, FillerSet, LagSchedule, LaggedTokenSource,
///     SequentialChooser,
/// };
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let source = LaggedTokenSource::new("hello world", LagSchedule::new());
/// let config = EngineConfig::default().speaking_interval(Duration::from_millis(1));
/// let (mut engine, drain) = AdaptivePacingEngine::spawn(
///     source,
///     config,
///     FillerSet::default(),
///     SequentialChooser::default(),
/// );
/// let mut spoken = Vec::new();
/// while let Some(u) = engine.next_utterance().await {
///     if let Some(t) = u.token() {
///         spoken.push(t.to_string());
///     }
/// }
/// assert_eq!(spoken, ["hello", "world"]);
/// drain.join().await.unwrap();
/// # });
/// ```
pub struct AdaptivePacingEngine {
    queue: UnboundedReceiver<String>,
    state: Arc<EngineState>,
    fillers: FillerSet,
    chooser: Box<dyn FillerChooser>,
    speaking_interval: Duration,
}

impl AdaptivePacingEngine {
    /// Starts draining `source` on a new tokio task and returns the engine
    /// together with the handle owning that task.
    ///
    /// The drain task is not awaited here; it runs concurrently with whatever
    /// consumes the engine. Must be called from within a tokio runtime.
    pub fn spawn<S>(
        mut source: S,
        config: EngineConfig,
        fillers: FillerSet,
        chooser: impl FillerChooser + 'static,
    ) -> (Self, DrainHandle)
    where
        S: TokenSource,
    {
        let (tx, rx) = unbounded_channel();
        let state = Arc::new(EngineState::default());
        debug!(
            check_interval = ?config.check_interval,
            "check_interval is accepted but has no effect"
        );
        let tokens = source.stream();
        let handle = tokio::spawn(
            drain_loop(tokens, tx, Arc::clone(&state), config.lag_threshold)
                .instrument(debug_span!("drain")),
        );
        let engine = Self {
            queue: rx,
            state: Arc::clone(&state),
            fillers,
            chooser: Box::new(chooser),
            speaking_interval: config.speaking_interval,
        };
        (engine, DrainHandle { handle, state })
    }

    /// Produces the next paced utterance, or `None` once the source is
    /// exhausted and every queued token has been spoken.
    ///
    /// Every returned utterance is followed by a sleep of the speaking
    /// interval. A token arriving during a filler's sleep is picked up by the
    /// next call.
    ///
    /// Not cancellation safe: a token is taken off the queue before the
    /// sleep, so dropping the future mid-sleep loses it. Await each call to
    /// completion rather than racing it in `select!` or `timeout`.
    ///
    /// A zero interval never yields to the timer, so tokio's paused test
    /// clock cannot advance past source delays; drive it with the real clock.
    pub async fn next_utterance(&mut self) -> Option<Utterance> {
        // Load before popping: once `finished` is seen every token is queued.
        let finished = self.state.finished.load(Ordering::Acquire);
        let utterance = match self.queue.try_recv() {
            Ok(token) => Utterance::Token(token),
            Err(TryRecvError::Empty) if !finished => {
                Utterance::Filler(self.fillers.choose(self.chooser.as_mut()).to_string())
            }
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                if !finished {
                    debug!("drain task stopped before the source was exhausted");
                }
                return None;
            }
        };
        tokio::time::sleep(self.speaking_interval).await;
        match &utterance {
            Utterance::Token(t) => {
                trace!(token = %t, "spoke token");
                self.state.counters.record_spoken();
            }
            Utterance::Filler(f) => {
                trace!(filler = %f, "spoke filler");
                self.state.counters.record_filler();
            }
        }
        Some(utterance)
    }

    /// Converts the engine into a stream yielding the same sequence as
    /// repeated [`next_utterance`][Self::next_utterance] calls.
    pub fn into_stream(self) -> BoxStream<'static, Utterance> {
        stream::unfold(self, |mut engine| async move {
            engine.next_utterance().await.map(|u| (u, engine))
        })
        .boxed()
    }

    /// True once the drain task has exhausted the source.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    pub fn fillers(&self) -> &FillerSet {
        &self.fillers
    }

    pub fn speaking_interval(&self) -> Duration {
        self.speaking_interval
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state.counters.snapshot()
    }
}

/// Ownership of the background drain task.
///
/// Dropping the handle detaches the task; it keeps running until the source
/// is exhausted. Use [`join`][Self::join] to wait for it or
/// [`abort`][Self::abort] to stop it early.
pub struct DrainHandle {
    handle: JoinHandle<()>,
    state: Arc<EngineState>,
}

impl DrainHandle {
    /// Waits for the drain task and returns the engine statistics at that
    /// point.
    pub async fn join(self) -> Result<StatsSnapshot, JoinError> {
        self.handle.await?;
        Ok(self.state.counters.snapshot())
    }

    /// Cancels the drain task. The engine ends once the queue is empty.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// True once the source has been fully drained.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state.counters.snapshot()
    }
}

async fn drain_loop(
    mut tokens: BoxStream<'static, String>,
    tx: UnboundedSender<String>,
    state: Arc<EngineState>,
    lag_threshold: Duration,
) {
    debug!("drain task started");
    let mut last_arrival = Instant::now();
    let mut position = 0usize;
    while let Some(token) = tokens.next().await {
        let now = Instant::now();
        let gap = now - last_arrival;
        last_arrival = now;
        if gap >= lag_threshold {
            state.counters.record_lag();
            debug!(position, ?gap, "lag detected");
        }
        trace!(position, %token, "queued token");
        state.counters.record_drained();
        // The engine may already be gone; the source is still drained.
        let _ = tx.send(token);
        position += 1;
    }
    state.finished.store(true, Ordering::Release);
    debug!(tokens = position, "drain task finished");
}

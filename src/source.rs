use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use tracing::trace;

use crate::LagSchedule;

/// A producer of text tokens.
///
/// Each call to [`stream`][TokenSource::stream] replays the source from the
/// beginning.
pub trait TokenSource {
    fn stream(&mut self) -> BoxStream<'static, String>;
}

/// Replays whitespace separated tokens, pausing before the positions named in
/// a [`LagSchedule`] to simulate a slow upstream feed.
///
/// # Example
///
/// ```
/// use cadence_rs::{LagSchedule, LaggedTokenSource, TokenSource};
/// use futures::StreamExt;
///
/// # tokio_test::block_on(async {
/// let mut source = LaggedTokenSource::new("a b c", LagSchedule::new().with(1, 5));
/// let tokens: Vec<String> = source.stream().collect().await;
/// assert_eq!(tokens, ["a", "b", "c"]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct LaggedTokenSource {
    tokens: Arc<[String]>,
    lag: Arc<LagSchedule>,
}

impl LaggedTokenSource {
    pub fn new(text: &str, lag: LagSchedule) -> Self {
        Self {
            tokens: tokenize(text).into(),
            lag: Arc::new(lag),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Delay applied before the token at `position`. Never fails.
    pub fn delay_at(&self, position: usize) -> Duration {
        self.lag.delay_at(position)
    }

    /// Replays the tokens on the calling thread, sleeping the thread for
    /// each configured delay.
    pub fn blocking_iter(&self) -> BlockingTokens<'_> {
        BlockingTokens {
            source: self,
            position: 0,
        }
    }
}

impl TokenSource for LaggedTokenSource {
    fn stream(&mut self) -> BoxStream<'static, String> {
        let tokens = Arc::clone(&self.tokens);
        let lag = Arc::clone(&self.lag);
        let s = stream! {
            for (position, token) in tokens.iter().enumerate() {
                let delay = lag.delay_at(position);
                if !delay.is_zero() {
                    trace!(position, ?delay, "source lagging");
                    tokio::time::sleep(delay).await;
                }
                trace!(position, %token, "source yielded token");
                yield token.clone();
            }
        };
        Box::pin(s)
    }
}

/// Synchronous replay returned by [`LaggedTokenSource::blocking_iter`].
pub struct BlockingTokens<'a> {
    source: &'a LaggedTokenSource,
    position: usize,
}

impl Iterator for BlockingTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let token = self.source.tokens.get(self.position)?;
        let delay = self.source.delay_at(self.position);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.position += 1;
        Some(token.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.source.len().saturating_sub(self.position);
        (left, Some(left))
    }
}

/// Splits text into whitespace delimited tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Instant;

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  one\ttwo\n three  "), ["one", "two", "three"]);
        assert!(tokenize("   ").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_before_lagged_token() {
        let mut source = LaggedTokenSource::new("a b c", LagSchedule::new().with(1, 100));
        let start = tokio::time::Instant::now();
        let mut stream = source.stream();

        assert_eq!(stream.next().await.as_deref(), Some("a"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(stream.next().await.as_deref(), Some("b"));
        assert!(start.elapsed() >= Duration::from_millis(100));
        let after_b = start.elapsed();
        assert_eq!(stream.next().await.as_deref(), Some("c"));
        assert_eq!(start.elapsed(), after_b);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_from_the_first_token() {
        let mut source = LaggedTokenSource::new("x y", LagSchedule::new().with(0, 10));
        let first: Vec<String> = source.stream().collect().await;
        let second: Vec<String> = source.stream().collect().await;
        assert_eq!(first, second);
        assert_eq!(first, ["x", "y"]);
    }

    #[tokio::test]
    async fn schedule_beyond_text_is_ignored() {
        let mut source = LaggedTokenSource::new("only", LagSchedule::new().with(5, 60_000));
        let tokens: Vec<String> = source.stream().collect().await;
        assert_eq!(tokens, ["only"]);
    }

    #[test]
    fn blocking_iter_replays_with_delays() {
        let source = LaggedTokenSource::new("a b", LagSchedule::new().with(1, 20));
        let start = Instant::now();
        let tokens: Vec<String> = source.blocking_iter().collect();
        assert_eq!(tokens, ["a", "b"]);
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(source.blocking_iter().size_hint(), (2, Some(2)));
    }
}

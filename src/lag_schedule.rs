use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::PacingError;

/// Sparse mapping from token position to an artificial arrival delay.
///
/// Positions that were never configured have no delay. Later entries for the
/// same position replace earlier ones.
///
/// ```
/// use cadence_rs::LagSchedule;
/// use std::time::Duration;
///
/// let lag: LagSchedule = "1:1000,3:2000".parse().unwrap();
/// assert_eq!(lag.delay_at(1), Duration::from_millis(1000));
/// assert_eq!(lag.delay_at(2), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(usize, u64)>")]
pub struct LagSchedule {
    delays: BTreeMap<usize, u64>,
}

impl LagSchedule {
    /// Creates an empty schedule; every position yields immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a delay of `ms` milliseconds before the token at `position`.
    pub fn with(mut self, position: usize, ms: u64) -> Self {
        self.delays.insert(position, ms);
        self
    }

    /// Delay configured for `position`, or [`Duration::ZERO`] when unset.
    pub fn delay_at(&self, position: usize) -> Duration {
        self.delays
            .get(&position)
            .copied()
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Configured `(position, milliseconds)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.delays.iter().map(|(p, ms)| (*p, *ms))
    }
}

impl FromIterator<(usize, u64)> for LagSchedule {
    fn from_iter<I: IntoIterator<Item = (usize, u64)>>(iter: I) -> Self {
        Self {
            delays: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<(usize, u64)>> for LagSchedule {
    fn from(pairs: Vec<(usize, u64)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl FromStr for LagSchedule {
    type Err = PacingError;

    /// Parses a comma separated list of `position:milliseconds` entries.
    /// Blank input gives an empty schedule.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (pos, ms) = entry
                    .split_once(':')
                    .ok_or_else(|| PacingError::InvalidLagEntry(entry.to_string()))?;
                let pos = pos
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| PacingError::InvalidLagEntry(entry.to_string()))?;
                let ms = ms
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| PacingError::InvalidLagEntry(entry.to_string()))?;
                Ok((pos, ms))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_position_has_no_delay() {
        let lag = LagSchedule::new().with(1, 100);
        assert_eq!(lag.delay_at(0), Duration::ZERO);
        assert_eq!(lag.delay_at(1), Duration::from_millis(100));
        assert_eq!(lag.delay_at(usize::MAX), Duration::ZERO);
    }

    #[test]
    fn later_entry_wins() {
        let lag: LagSchedule = vec![(2, 10), (2, 30)].into();
        assert_eq!(lag.len(), 1);
        assert_eq!(lag.delay_at(2), Duration::from_millis(30));
    }

    #[test]
    fn parses_entry_list() {
        let lag: LagSchedule = " 1:1000, 3:2000 ,".parse().unwrap();
        assert_eq!(lag.iter().collect::<Vec<_>>(), vec![(1, 1000), (3, 2000)]);
        assert!("".parse::<LagSchedule>().unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_entries() {
        for bad in ["1", "a:10", "1:-5", "1:2:3"] {
            match bad.parse::<LagSchedule>() {
                Err(PacingError::InvalidLagEntry(entry)) => assert_eq!(entry, bad),
                other => panic!("expected InvalidLagEntry for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn deserializes_from_pairs() {
        #[derive(Deserialize)]
        struct Wrapper {
            lag: LagSchedule,
        }
        let w: Wrapper = toml::from_str("lag = [[1, 1000], [7, 2000]]").unwrap();
        assert_eq!(w.lag.delay_at(7), Duration::from_millis(2000));
    }
}

//! Trailing time-window sampling of event streams
//!
//! Every input row `i` yields the ids of all rows `j <= i` whose timestamp is
//! less than the window duration before row `i`'s timestamp, i.e. the
//! half-open interval `(t_i - W, t_i]`. Consecutive windows overlap heavily;
//! that redundancy is what gives frequent-pattern support its meaning.
//!
//! ```text
//! t(ms):  0   1   2   7   8
//! id:     a   b   c   d   e          W = 5ms
//!
//! row 0 → [a]
//! row 1 → [a, b]
//! row 2 → [a, b, c]
//! row 3 → [c, d]        (a, b fell out: 7 - 1 >= 5)
//! row 4 → [d, e]
//! ```

use crate::catalog::EventId;
use chrono::{NaiveDateTime, TimeDelta};

/// One time-windowed excerpt of observed execution order
pub type Sequence = Vec<EventId>;

/// A timestamped event as produced by the log parser
pub type TimedEvent = (NaiveDateTime, EventId);

/// Stable sort by timestamp; rows with equal timestamps keep their input order
pub fn sort_by_time(events: &mut [TimedEvent]) {
    events.sort_by_key(|(timestamp, _)| *timestamp);
}

/// Window length for `window_ms`, or `None` when it does not fit a `TimeDelta`
pub fn window_duration(window_ms: u64) -> Option<TimeDelta> {
    i64::try_from(window_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
}

/// Sliding-window sequence sampler
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceWindower {
    window: TimeDelta,
    min_len: usize,
    max_len: usize,
    max_windows: Option<usize>,
}

impl SequenceWindower {
    /// Windower with the default length bounds `[2, 16]`
    ///
    /// A window too long for a `TimeDelta` saturates to `TimeDelta::MAX`.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: window_duration(window_ms).unwrap_or(TimeDelta::MAX),
            min_len: 2,
            max_len: 16,
            max_windows: None,
        }
    }

    /// Emit only windows with at least `min_len` members, keeping the earliest `max_len`
    pub fn with_bounds(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    /// Consider at most `max_windows` rows (counted before length filtering)
    pub fn with_max_windows(mut self, max_windows: Option<usize>) -> Self {
        self.max_windows = max_windows;
        self
    }

    /// Produce every trailing-window sequence of a time-sorted event stream
    ///
    /// The caller is responsible for sorting (see [`sort_by_time`]).
    pub fn windows(&self, events: &[TimedEvent]) -> Vec<Sequence> {
        let rows = self.max_windows.unwrap_or(usize::MAX).min(events.len());
        let mut sequences = Vec::new();
        let mut start = 0;

        for i in 0..rows {
            let now = events[i].0;
            while start < i && now - events[start].0 >= self.window {
                start += 1;
            }

            let len = i + 1 - start;
            if len < self.min_len {
                continue;
            }
            sequences.push(
                events[start..=i]
                    .iter()
                    .take(self.max_len)
                    .map(|(_, id)| *id)
                    .collect(),
            );
        }

        sequences
    }
}

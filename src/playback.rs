use std::ops::Range;

use crate::types::{Fixation, GazeSample, Saccade};

/// Gives a stream element its end time on the playback clock.
///
/// A cursor moves past an element once its end time has been reached: a gaze
/// sample ends at its own `system_time`, a saccade at its last member's, and
/// a fixation at `start + duration`.
pub trait PlaybackEvent {
    fn end_ms(&self) -> f64;
}

impl PlaybackEvent for GazeSample {
    fn end_ms(&self) -> f64 {
        self.system_time as f64
    }
}

impl PlaybackEvent for Saccade {
    fn end_ms(&self) -> f64 {
        self.end_time() as f64
    }
}

impl PlaybackEvent for Fixation {
    fn end_ms(&self) -> f64 {
        self.end_ms
    }
}

/// Monotonic playback position within one event stream.
///
/// `current` is the index of the event now active (the first one whose end
/// time is still ahead of the playhead), or `None` once the stream is
/// exhausted — exhaustion latches and signals "nothing more to draw", not an
/// error. `window_begin` trails behind for rolling-window rendering. Both
/// indices only ever move forward within a playback pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCursor {
    current: Option<usize>,
    window_begin: usize,
}

impl StreamCursor {
    pub fn new(stream_len: usize) -> Self {
        Self {
            current: (stream_len > 0).then_some(0),
            window_begin: 0,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Advances past every event whose end time is `<= timestamp` and returns
    /// the index of the event now active. Returns `None` once the cursor runs
    /// past the end of the stream; callers stop drawing this stream for the
    /// rest of playback.
    ///
    /// Timestamps must be non-decreasing across calls within a pass, which
    /// makes this a two-pointer sweep: O(1) amortized, O(n) total.
    pub fn advance<E: PlaybackEvent>(&mut self, events: &[E], timestamp: f64) -> Option<usize> {
        let mut idx = self.current?;
        while idx < events.len() && events[idx].end_ms() <= timestamp {
            idx += 1;
        }
        if idx >= events.len() {
            self.current = None;
            None
        } else {
            self.current = Some(idx);
            Some(idx)
        }
    }

    /// Advances the rolling-window begin past every event whose end time is
    /// `<= timestamp - window_ms`, clamped so it never passes the current
    /// cursor, and returns the window as a range of indices.
    ///
    /// The returned range covers exactly the events whose end time falls in
    /// `(timestamp - window_ms, timestamp]`. A window of zero or less
    /// degenerates to an empty range ("no history, draw only the current
    /// event"), which is a supported configuration.
    pub fn advance_window<E: PlaybackEvent>(
        &mut self,
        events: &[E],
        timestamp: f64,
        window_ms: f64,
    ) -> Range<usize> {
        let cutoff = timestamp - window_ms.max(0.0);
        // An exhausted stream draws nothing, so its window is empty; this
        // also keeps the begin index from ever running past the array end.
        let limit = match self.current {
            Some(idx) => idx,
            None => return self.window_begin..self.window_begin,
        };
        while self.window_begin < limit && events[self.window_begin].end_ms() <= cutoff {
            self.window_begin += 1;
        }
        self.window_begin..limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EyeRaw;

    fn sample(t: i64) -> GazeSample {
        GazeSample {
            event_time: t,
            system_time: t,
            x: 1.0,
            y: 1.0,
            raw: EyeRaw::default(),
        }
    }

    #[test]
    fn test_empty_stream_starts_exhausted() {
        let cursor = StreamCursor::new(0);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_advance_returns_active_event() {
        let gazes: Vec<GazeSample> = [10, 20, 30].iter().map(|&t| sample(t)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        assert_eq!(cursor.advance(&gazes, 0.0), Some(0));
        assert_eq!(cursor.advance(&gazes, 10.0), Some(1));
        assert_eq!(cursor.advance(&gazes, 25.0), Some(2));
    }

    #[test]
    fn test_advance_latches_exhausted() {
        let gazes: Vec<GazeSample> = [10, 20].iter().map(|&t| sample(t)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        assert_eq!(cursor.advance(&gazes, 100.0), None);
        assert!(cursor.is_exhausted());
        // Stays exhausted on further calls.
        assert_eq!(cursor.advance(&gazes, 200.0), None);
    }

    #[test]
    fn test_cursor_monotonicity() {
        let gazes: Vec<GazeSample> = (0..50).map(|t| sample(t * 10)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        let mut prev = 0usize;
        for step in 0..100 {
            let ts = step as f64 * 4.7;
            match cursor.advance(&gazes, ts) {
                Some(idx) => {
                    assert!(idx >= prev, "cursor moved backward: {} < {}", idx, prev);
                    prev = idx;
                }
                None => break,
            }
        }
    }

    #[test]
    fn test_rolling_window_contents() {
        // Samples at 0, 10, ..., 90. At t=55 with a 30 ms window the window
        // must hold exactly the samples in (25, 55]: 30, 40, 50.
        let gazes: Vec<GazeSample> = (0..10).map(|t| sample(t * 10)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        assert_eq!(cursor.advance(&gazes, 55.0), Some(6));
        let window = cursor.advance_window(&gazes, 55.0, 30.0);
        let times: Vec<i64> = window.map(|i| gazes[i].system_time).collect();
        assert_eq!(times, vec![30, 40, 50]);
    }

    #[test]
    fn test_zero_window_degenerates_to_current_only() {
        let gazes: Vec<GazeSample> = (0..10).map(|t| sample(t * 10)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        let current = cursor.advance(&gazes, 45.0).unwrap();
        let window = cursor.advance_window(&gazes, 45.0, 0.0);
        assert!(window.is_empty());
        assert_eq!(window.start, current);

        // Negative windows behave the same, not as an error.
        let window = cursor.advance_window(&gazes, 45.0, -100.0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_begin_clamps_at_stream_end() {
        // Once the stream is exhausted the window advance must not run past
        // the array end, whatever the timestamp.
        let gazes: Vec<GazeSample> = (0..3).map(|t| sample(t * 10)).collect();
        let mut cursor = StreamCursor::new(gazes.len());
        assert_eq!(cursor.advance(&gazes, 1_000_000.0), None);
        let window = cursor.advance_window(&gazes, 1_000_000.0, 1000.0);
        assert!(window.is_empty());
        assert!(window.start <= gazes.len());
    }

    #[test]
    fn test_fixation_end_uses_converted_clock() {
        use crate::types::Fixation;
        // Fixation starting at Unix epoch with a 100 ms dwell.
        let fixations = vec![Fixation::new(1, 1, 116_444_736_000_000_000, 0.0, 0.0, 100)];
        let mut cursor = StreamCursor::new(1);
        assert_eq!(cursor.advance(&fixations, 50.0), Some(0));
        assert_eq!(cursor.advance(&fixations, 100.0), None);
    }
}

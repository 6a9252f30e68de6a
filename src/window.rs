use chrono::{DateTime, Duration, Utc};

use crate::{Result, SerieslyError};

/// Upper bound on samples per window. A day at one-second resolution fits.
pub const MAX_POINTS: usize = 100_000;

/// A request window in epoch milliseconds, iterated as
/// `start, start + step, ...` while strictly below `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: i64,
    stop: i64,
    step: i64,
}

impl Window {
    pub fn new(start: i64, stop: i64, step: i64) -> Result<Self> {
        if step <= 0 {
            return Err(SerieslyError::InvalidWindow(format!(
                "step must be > 0, was {}",
                step
            )));
        }
        let window = Self { start, stop, step };
        let points = window.points();
        if points > MAX_POINTS as i128 {
            return Err(SerieslyError::InvalidWindow(format!(
                "{} points requested, at most {} allowed",
                points, MAX_POINTS
            )));
        }
        Ok(window)
    }

    pub fn from_times(start: DateTime<Utc>, stop: DateTime<Utc>, step: Duration) -> Result<Self> {
        Self::new(start.timestamp_millis(), stop.timestamp_millis(), step.num_milliseconds())
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Number of samples in the window, `ceil((stop - start) / step)`.
    pub fn len(&self) -> usize {
        self.points() as usize
    }

    fn points(&self) -> i128 {
        if self.stop <= self.start {
            return 0;
        }
        let span = self.stop as i128 - self.start as i128;
        let step = self.step as i128;
        (span + step - 1) / step
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> {
        let (stop, step) = (self.stop, self.step);
        std::iter::successors(Some(self.start), move |i| i.checked_add(step))
            .take_while(move |i| *i < stop)
    }
}

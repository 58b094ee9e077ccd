//! Bounded log of head positions replayed by each segment at its own lag.

use std::{collections::VecDeque, time::Duration};

use glam::Vec3;
use log::debug;

/// Head position recorded at a point in simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimestampedSample {
    /// Recorded head position.
    pub position: Vec3,
    /// Simulation time of the recording.
    pub timestamp: Duration,
}

/// Append-only log of head samples with one read cursor per segment.
///
/// Every segment consumes the same recorded stream, but each keeps its own
/// cursor, so a segment that has already moved past a sample never hides it
/// from a segment with a longer lag. Cursors are sequence numbers rather than
/// indices and survive eviction of the oldest samples.
#[derive(Clone, Debug)]
pub struct PositionHistory {
    samples: VecDeque<TimestampedSample>,
    capacity: usize,
    motion_threshold: f32,
    first_sequence: u64,
    cursors: Vec<u64>,
    last_recorded: Option<Vec3>,
}

impl PositionHistory {
    /// Creates an empty log holding at most `capacity` samples for `readers` segments.
    #[must_use]
    pub fn new(capacity: usize, motion_threshold: f32, readers: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            motion_threshold,
            first_sequence: 0,
            cursors: vec![0; readers],
            last_recorded: None,
        }
    }

    /// Appends `position` unless it lies within the motion threshold of the
    /// previously recorded position. Evicts the oldest sample when full.
    ///
    /// Returns whether a sample was appended.
    pub fn record(&mut self, position: Vec3, time: Duration) -> bool {
        if let Some(previous) = self.last_recorded {
            if previous.distance(position) <= self.motion_threshold {
                return false;
            }
        }

        if self.samples.len() >= self.capacity {
            let _ = self.samples.pop_front();
            self.first_sequence += 1;
        }
        self.samples.push_back(TimestampedSample {
            position,
            timestamp: time,
        });
        self.last_recorded = Some(position);
        true
    }

    /// Moves `reader` past every unread sample recorded strictly before
    /// `now - lag`, returning the newest of them.
    ///
    /// Consumption is forward-only: the reader never revisits a sample.
    /// Returns `None` when no unread sample is old enough.
    pub fn advance_reader(
        &mut self,
        reader: usize,
        now: Duration,
        lag: Duration,
    ) -> Option<TimestampedSample> {
        let cutoff = now.checked_sub(lag)?;
        let cursor = self.cursors.get_mut(reader)?;

        if *cursor < self.first_sequence {
            debug!(
                "history reader {reader} skipped {} evicted samples",
                self.first_sequence - *cursor
            );
        }
        let mut index = usize::try_from(cursor.saturating_sub(self.first_sequence)).ok()?;
        let mut consumed = None;
        while let Some(sample) = self.samples.get(index) {
            if sample.timestamp >= cutoff {
                break;
            }
            consumed = Some(*sample);
            index += 1;
        }

        *cursor = self.first_sequence + index as u64;
        consumed
    }

    /// Position `reader` should head toward at `now` given its `lag`.
    ///
    /// Falls back to `fallback` when no sample qualifies.
    pub fn sample_at_lag(
        &mut self,
        reader: usize,
        now: Duration,
        lag: Duration,
        fallback: Vec3,
    ) -> Vec3 {
        self.advance_reader(reader, now, lag)
            .map_or(fallback, |sample| sample.position)
    }

    /// Treats `position` as already recorded without appending it, so a head
    /// resting there adds nothing until it moves past the motion threshold.
    pub fn rest_at(&mut self, position: Vec3) {
        self.last_recorded = Some(position);
    }

    /// Drops every sample and rewinds all readers.
    ///
    /// The next [`PositionHistory::record`] call always appends.
    pub fn clear(&mut self) {
        self.first_sequence += self.samples.len() as u64;
        self.samples.clear();
        let next = self.first_sequence;
        self.cursors.iter_mut().for_each(|cursor| *cursor = next);
        self.last_recorded = None;
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Reports whether no samples are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterator over retained samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedSample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn stationary_head_is_recorded_once() {
        let mut history = PositionHistory::new(8, 0.1, 1);
        assert!(history.record(Vec3::ZERO, ms(0)));
        assert!(!history.record(Vec3::new(0.05, 0.0, 0.0), ms(10)));
        assert!(history.record(Vec3::new(0.5, 0.0, 0.0), ms(20)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn resting_head_records_nothing_until_it_moves() {
        let mut history = PositionHistory::new(8, 0.1, 1);
        history.rest_at(Vec3::ONE);
        assert!(!history.record(Vec3::ONE, ms(10)));
        assert!(history.is_empty());
        assert!(history.record(Vec3::new(1.0, 1.0, 2.0), ms(20)));
    }

    #[test]
    fn oldest_sample_is_evicted_at_capacity() {
        let mut history = PositionHistory::new(3, 0.0, 1);
        for step in 0..5u64 {
            assert!(history.record(Vec3::X * step as f32, ms(step * 10)));
        }
        assert_eq!(history.len(), history.capacity());
        let oldest = history.iter().next().expect("retained sample");
        assert_eq!(oldest.timestamp, ms(20));
    }

    #[test]
    fn reader_returns_newest_sample_before_cutoff() {
        let mut history = PositionHistory::new(16, 0.0, 1);
        for step in 0..10u64 {
            let _ = history.record(Vec3::X * step as f32, ms(step * 10));
        }

        let sample = history
            .advance_reader(0, ms(95), ms(30))
            .expect("samples older than cutoff");
        assert_eq!(sample.timestamp, ms(60));

        assert!(history.advance_reader(0, ms(95), ms(30)).is_none());
    }

    #[test]
    fn sample_at_cutoff_is_not_yet_due() {
        let mut history = PositionHistory::new(4, 0.0, 1);
        let _ = history.record(Vec3::ONE, ms(100));
        assert_eq!(history.sample_at_lag(0, ms(200), ms(100), Vec3::ZERO), Vec3::ZERO);
        assert_eq!(history.sample_at_lag(0, ms(201), ms(100), Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn lag_longer_than_elapsed_time_uses_fallback() {
        let mut history = PositionHistory::new(4, 0.0, 1);
        let _ = history.record(Vec3::ONE, ms(0));
        let fallback = Vec3::new(9.0, 9.0, 9.0);
        assert_eq!(history.sample_at_lag(0, ms(50), ms(100), fallback), fallback);
    }

    #[test]
    fn readers_do_not_starve_each_other() {
        let mut history = PositionHistory::new(16, 0.0, 2);
        for step in 0..10u64 {
            let _ = history.record(Vec3::X * step as f32, ms(step * 10));
        }

        let short = history.advance_reader(0, ms(100), ms(10)).expect("short lag");
        let long = history.advance_reader(1, ms(100), ms(50)).expect("long lag");

        assert_eq!(short.timestamp, ms(80));
        assert_eq!(long.timestamp, ms(40));
    }

    #[test]
    fn reader_behind_evicted_samples_resumes_at_oldest() {
        let mut history = PositionHistory::new(2, 0.0, 1);
        assert_eq!(history.capacity(), 2);
        for step in 0..6u64 {
            let _ = history.record(Vec3::X * step as f32, ms(step * 10));
        }

        let sample = history.advance_reader(0, ms(100), ms(0)).expect("retained");
        assert_eq!(sample.timestamp, ms(50));
    }

    #[test]
    fn clear_rewinds_readers_and_accepts_next_record() {
        let mut history = PositionHistory::new(4, 1.0, 1);
        let _ = history.record(Vec3::ZERO, ms(0));
        history.clear();

        assert!(history.is_empty());
        assert!(history.record(Vec3::ZERO, ms(10)));
        let sample = history.advance_reader(0, ms(20), ms(0)).expect("fresh sample");
        assert_eq!(sample.timestamp, ms(10));
    }
}

//! Heartbeat stall detector
//!
//! A no-op task that wakes on a fixed interval on the same runtime as the
//! workload and records how long it actually waited since the previous beat.
//! Whatever a task claims to do, if it holds the scheduler thread the next
//! beat arrives late, and the gap shows up here.
//!
//! ```text
//!  beat        beat        beat                          beat
//!   │──1ms──────│──1ms──────│─────────── 52ms ────────────│
//!                                  ▲
//!                      adapter blocks the thread
//! ```
//!
//! The beat loop does no logging and writes into a vector sized up front, so
//! its own cost stays well below the stall threshold.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// When the beat ran, relative to the start of the run
    pub at: Duration,
    /// Wall-clock time since the previous beat
    pub gap: Duration,
}

impl Sample {
    #[must_use]
    pub fn is_stall(&self, threshold: Duration) -> bool {
        self.gap > threshold
    }
}

/// Handle to a running heartbeat
pub struct Heartbeat {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Vec<Sample>>,
}

impl Heartbeat {
    /// Spawn the heartbeat on the current runtime
    ///
    /// `origin` is the run start that sample timestamps are measured from;
    /// `capacity` is the number of beats to preallocate for.
    #[must_use]
    pub fn start(origin: Instant, interval: Duration, capacity: usize) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        // Measured from spawn, so a thread blocked before the first poll still counts
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut samples = Vec::with_capacity(capacity);
            let mut ticker = tokio::time::interval(interval);
            // After a stall, resume the normal cadence instead of bursting
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = started;

            let beat = |samples: &mut Vec<Sample>, last: &mut Instant| {
                let now = Instant::now();
                let gap = now.saturating_duration_since(*last);
                if !gap.is_zero() {
                    samples.push(Sample { at: now.saturating_duration_since(origin), gap });
                    *last = now;
                }
            };

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => {
                        // The trailing gap, which no delivered tick may have covered
                        beat(&mut samples, &mut last);
                        break;
                    }
                    _ = ticker.tick() => beat(&mut samples, &mut last),
                }
            }

            samples
        });

        Self { stop, handle }
    }

    /// Stop the heartbeat and collect its samples
    ///
    /// Waits at most `grace` for the beat loop to notice the stop signal. If it
    /// cannot be joined in time the samples are lost and an empty sequence is
    /// returned.
    pub async fn stop(self, grace: Duration) -> Vec<Sample> {
        // The receiver only disappears if the task already ended
        let _ = self.stop.send(());

        match tokio::time::timeout(grace, self.handle).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                log::warn!("heartbeat task failed: {e}");
                Vec::new()
            }
            Err(_) => {
                log::warn!("heartbeat did not stop within {grace:?}, samples discarded");
                Vec::new()
            }
        }
    }
}

/// Samples whose gap exceeded `threshold`, in time order
pub fn stalls(samples: &[Sample], threshold: Duration) -> impl Iterator<Item = &Sample> {
    samples.iter().filter(move |s| s.is_stall(threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_sample_count_tracks_interval() {
        let interval = Duration::from_millis(5);
        let run = Duration::from_millis(100);

        let heartbeat = Heartbeat::start(Instant::now(), interval, 32);
        tokio::time::sleep(run).await;
        let samples = heartbeat.stop(GRACE).await;

        let expected = (run.as_millis() / interval.as_millis()) as usize;
        assert!(
            samples.len().abs_diff(expected) <= 1,
            "expected ~{expected} samples, got {}",
            samples.len()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_strictly_increasing() {
        let heartbeat = Heartbeat::start(Instant::now(), Duration::from_millis(2), 64);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let samples = heartbeat.stop(GRACE).await;

        assert!(!samples.is_empty());
        assert!(samples.windows(2).all(|w| w[0].at < w[1].at));
        assert!(samples.iter().all(|s| !s.gap.is_zero()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_runtime_has_no_stalls() {
        let heartbeat = Heartbeat::start(Instant::now(), Duration::from_millis(1), 128);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let samples = heartbeat.stop(GRACE).await;

        assert_eq!(stalls(&samples, Duration::from_millis(10)).count(), 0);
    }

    #[tokio::test]
    async fn test_blocked_thread_shows_as_stall() {
        let threshold = Duration::from_millis(10);
        let heartbeat = Heartbeat::start(Instant::now(), Duration::from_millis(1), 256);

        // Let the heartbeat settle into its cadence, then park the thread
        tokio::time::sleep(Duration::from_millis(10)).await;
        std::thread::sleep(Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let samples = heartbeat.stop(GRACE).await;
        let found: Vec<_> = stalls(&samples, threshold).collect();
        assert!(!found.is_empty(), "no stall recorded in {} samples", samples.len());
        assert!(found.iter().any(|s| s.gap >= Duration::from_millis(45)));
    }

    #[tokio::test]
    async fn test_block_before_first_beat_is_measured() {
        let heartbeat = Heartbeat::start(Instant::now(), Duration::from_millis(1), 16);

        // The heartbeat never gets polled before the stop signal
        std::thread::sleep(Duration::from_millis(30));
        let samples = heartbeat.stop(GRACE).await;

        let longest = stalls(&samples, Duration::from_millis(10)).map(|s| s.gap).max();
        assert!(longest >= Some(Duration::from_millis(30)), "samples: {samples:?}");
    }

    #[tokio::test]
    async fn test_trailing_gap_recorded_on_stop() {
        let heartbeat = Heartbeat::start(Instant::now(), Duration::from_millis(1), 64);
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Block, then stop without yielding in between
        std::thread::sleep(Duration::from_millis(40));
        let samples = heartbeat.stop(GRACE).await;

        let last = samples.last().unwrap();
        assert!(last.gap >= Duration::from_millis(40), "last sample {last:?}");
    }

    #[test]
    fn test_is_stall_is_strict() {
        let sample = Sample { at: Duration::from_millis(20), gap: Duration::from_millis(10) };
        assert!(!sample.is_stall(Duration::from_millis(10)));
        assert!(sample.is_stall(Duration::from_millis(9)));
    }
}

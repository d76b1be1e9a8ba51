//! Run configuration
//!
//! Built once per invocation and only read afterwards. Everything the engine
//! needs to size and time a run lives here; pass/fail thresholds live in
//! [`crate::analysis::EvaluationPolicy`].

use super::errors::ConfigError;
use std::time::Duration;

/// Concurrent tasks launched per run
pub const DEFAULT_TASKS: usize = 1000;

/// Deliberately slow tasks mixed into the workload
pub const DEFAULT_BLOCKING_TASKS: usize = 1;

/// Global deadline for all tasks to settle
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Heartbeat gap above which the scheduler counts as stalled
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_millis(10);

/// Heartbeat cadence
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Extra time allowed after the deadline to stop the heartbeat and collect
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub task_count: usize,
    pub blocking_task_count: usize,
    pub timeout: Duration,
    pub stall_threshold: Duration,
    pub heartbeat_interval: Duration,
    pub grace_period: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            task_count: DEFAULT_TASKS,
            blocking_task_count: DEFAULT_BLOCKING_TASKS,
            timeout: DEFAULT_TIMEOUT,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl RunConfig {
    /// Number of probe tasks in the workload
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.task_count.saturating_sub(self.blocking_task_count)
    }

    /// Check the task counts alone
    ///
    /// # Errors
    /// Returns the first count that makes the workload impossible to build
    pub fn validate_counts(&self) -> Result<(), ConfigError> {
        if self.task_count == 0 {
            return Err(ConfigError::ZeroTasks);
        }
        if self.blocking_task_count == 0 {
            return Err(ConfigError::ZeroBlockingTasks);
        }
        if self.blocking_task_count >= self.task_count {
            return Err(ConfigError::NoProbeTasks {
                tasks: self.task_count,
                blocking: self.blocking_task_count,
            });
        }
        Ok(())
    }

    /// Check the whole configuration before anything is launched
    ///
    /// # Errors
    /// Returns a [`ConfigError`] describing the first invalid field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_counts()?;

        for (name, value) in [
            ("timeout", self.timeout),
            ("stall threshold", self.stall_threshold),
            ("heartbeat interval", self.heartbeat_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { name });
            }
        }

        // A heartbeat slower than the threshold reports every beat as a stall
        if self.heartbeat_interval >= self.stall_threshold {
            return Err(ConfigError::HeartbeatTooSlow {
                interval: self.heartbeat_interval,
                threshold: self.stall_threshold,
            });
        }

        Ok(())
    }

    /// Upper bound on heartbeat samples for a full-length run
    #[must_use]
    pub fn expected_heartbeats(&self) -> usize {
        const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

        let beats = self.timeout.as_nanos() / self.heartbeat_interval.as_nanos().max(1);
        usize::try_from(beats).unwrap_or(usize::MAX).saturating_add(1).min(MAX_PREALLOCATED_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tasks: usize, blocking: usize) -> RunConfig {
        RunConfig { task_count: tasks, blocking_task_count: blocking, ..RunConfig::default() }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(RunConfig::default().validate(), Ok(()));
        assert_eq!(RunConfig::default().probe_count(), 999);
    }

    #[test]
    fn test_rejects_non_positive_counts() {
        assert_eq!(config(0, 1).validate(), Err(ConfigError::ZeroTasks));
        assert_eq!(config(10, 0).validate(), Err(ConfigError::ZeroBlockingTasks));
    }

    #[test]
    fn test_requires_at_least_one_probe() {
        assert_eq!(
            config(4, 4).validate(),
            Err(ConfigError::NoProbeTasks { tasks: 4, blocking: 4 })
        );
        assert_eq!(config(5, 4).validate(), Ok(()));
        assert_eq!(
            config(10, usize::MAX).validate(),
            Err(ConfigError::NoProbeTasks { tasks: 10, blocking: usize::MAX })
        );
    }

    #[test]
    fn test_rejects_zero_durations() {
        let cfg = RunConfig { timeout: Duration::ZERO, ..RunConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDuration { name: "timeout" }));
    }

    #[test]
    fn test_heartbeat_must_beat_faster_than_threshold() {
        let cfg = RunConfig {
            heartbeat_interval: Duration::from_millis(10),
            stall_threshold: Duration::from_millis(10),
            ..RunConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::HeartbeatTooSlow { .. })));
    }

    #[test]
    fn test_expected_heartbeats() {
        let cfg = RunConfig {
            timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_millis(2),
            ..RunConfig::default()
        };
        assert_eq!(cfg.expected_heartbeats(), 2501);
    }
}

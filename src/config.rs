//! # Engine configuration.
//!
//! [`EngineConfig`] defines the admission engine's behavior: team size, the
//! fixed job duration, the per-worker quota policy, and event-bus capacity.
//! All four are set at construction and fixed for the process lifetime.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use crewgate::{EngineConfig, QuotaPolicy};
//!
//! let mut cfg = EngineConfig::default();
//! cfg.team_size = 3;
//! cfg.job_duration = Duration::from_millis(50);
//! cfg.quota = QuotaPolicy { max_claims: 5, window: Duration::from_millis(600) };
//!
//! assert!(cfg.validate().is_ok());
//! ```

use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::QuotaPolicy;

/// Construction-time configuration for the team and its workers.
///
/// Controls the number of workers, how long each accepted claim occupies a
/// worker, the sliding-window quota every worker enforces, and the capacity
/// of the event bus channel.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Number of workers in the team (fixed; never resized).
    pub team_size: usize,
    /// How long an accepted claim occupies a worker.
    pub job_duration: Duration,
    /// Per-worker sliding-window quota.
    pub quota: QuotaPolicy,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for EngineConfig {
    /// Provides a default configuration:
    /// - `team_size = 1`
    /// - `job_duration = 50ms`
    /// - `quota = 5 claims / 600ms`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            team_size: 1,
            job_duration: Duration::from_millis(50),
            quota: QuotaPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Rejects degenerate configurations before any worker accepts traffic.
    ///
    /// Checks, in order: team size, job duration, quota size, window length.
    /// The first failing knob is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_size == 0 {
            return Err(ConfigError::TeamSize);
        }
        if self.job_duration.is_zero() {
            return Err(ConfigError::JobDuration);
        }
        if self.quota.max_claims == 0 {
            return Err(ConfigError::MaxClaims);
        }
        if self.quota.window.is_zero() {
            return Err(ConfigError::Window);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_team_size_rejected() {
        let cfg = EngineConfig {
            team_size: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TeamSize));
    }

    #[test]
    fn zero_job_duration_rejected() {
        let cfg = EngineConfig {
            job_duration: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::JobDuration));
    }

    #[test]
    fn zero_quota_rejected() {
        let cfg = EngineConfig {
            quota: QuotaPolicy {
                max_claims: 0,
                window: Duration::from_millis(600),
            },
            ..EngineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MaxClaims));
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = EngineConfig {
            quota: QuotaPolicy {
                max_claims: 5,
                window: Duration::ZERO,
            },
            ..EngineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Window));
    }
}

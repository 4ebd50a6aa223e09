//! Engine configuration.
//!
//! Every field has a default, so configuration files only need to name the
//! values they change. Loading from disk lives in `freightyard-data`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the cars of any one job.
pub const DEFAULT_MAX_CARS_PER_JOB: u32 = 12;

/// Top-level configuration for a [`Network`](crate::network::Network) and its
/// [`JobBoard`](crate::engine::JobBoard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for downstream routing and generative car counts.
    pub seed: u64,
    /// Car ceiling per job; excess cars wait in the station's overflow.
    pub max_cars_per_job: u32,
    pub notifier: NotifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_cars_per_job: DEFAULT_MAX_CARS_PER_JOB,
            notifier: NotifierConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Queue sizes and timeouts for the change notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Capacity of the notifier's command inbox.
    pub inbox_capacity: usize,
    /// Capacity of each subscriber's outbox.
    pub outbox_capacity: usize,
    /// How long a publish may wait for inbox space before the event is dropped.
    pub publish_timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 256,
            outbox_capacity: 64,
            publish_timeout_ms: 50,
        }
    }
}

impl NotifierConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_cars_per_job, 12);
        assert_eq!(cfg.notifier.inbox_capacity, 256);
        assert_eq!(cfg.notifier.publish_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"seed": 9, "notifier": {"outbox_capacity": 4}}"#).unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.max_cars_per_job, 12);
        assert_eq!(cfg.notifier.outbox_capacity, 4);
        assert_eq!(cfg.notifier.inbox_capacity, 256);
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_TTL_MS: u64 = 3_000;
pub const DEFAULT_LOAD_GRACE_MS: u64 = 3_000;
pub const DEFAULT_MAX_EVICTIONS_PER_SWEEP: usize = 50;

/// Residency policy of the chunk cache. Times are in simulation ticks
/// (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Idle time after which a static-only chunk may be evicted.
    pub chunk_ttl_ms: u64,
    /// Added to the creation time so a fresh chunk survives its first sweeps.
    pub load_grace_ms: u64,
    pub max_evictions_per_sweep: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            chunk_ttl_ms: DEFAULT_CHUNK_TTL_MS,
            load_grace_ms: DEFAULT_LOAD_GRACE_MS,
            max_evictions_per_sweep: DEFAULT_MAX_EVICTIONS_PER_SWEEP,
        }
    }
}

impl CacheConfig {
    pub fn chunk_ttl(&self) -> Duration {
        Duration::from_millis(self.chunk_ttl_ms)
    }

    pub fn load_grace(&self) -> Duration {
        Duration::from_millis(self.load_grace_ms)
    }

    pub(crate) fn eviction_cap(&self) -> usize {
        self.max_evictions_per_sweep.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "chunk_ttl_ms": 500 }"#).expect("config");
        assert_eq!(config.chunk_ttl(), Duration::from_millis(500));
        assert_eq!(config.load_grace(), Duration::from_millis(DEFAULT_LOAD_GRACE_MS));
        assert_eq!(
            config.max_evictions_per_sweep,
            DEFAULT_MAX_EVICTIONS_PER_SWEEP
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<CacheConfig>(r#"{ "ttl": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_eviction_cap_still_removes_one() {
        let config = CacheConfig {
            max_evictions_per_sweep: 0,
            ..CacheConfig::default()
        };
        assert_eq!(config.eviction_cap(), 1);
    }
}

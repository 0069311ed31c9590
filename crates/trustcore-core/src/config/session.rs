//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in hours, renewed on refresh.
    #[serde(default = "default_ttl")]
    pub ttl_hours: u64,
    /// Maximum stored sessions per user. The oldest is evicted on overflow.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_user: usize,
    /// Interval between expired-session sweeps in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl(),
            max_sessions_per_user: default_max_sessions(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    24
}

fn default_max_sessions() -> usize {
    5
}

fn default_cleanup_interval() -> u64 {
    15
}

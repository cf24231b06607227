//! `[throttle]` section configuration.
//!
//! Leaky-bucket budget for the remote admin API.
//!
//! # Example
//!
//! ```toml
//! [throttle]
//! capacity = 40      # Bucket size advertised by the remote endpoint
//! padding = 2        # Requests kept in reserve below capacity
//! leak_rate = 2      # Requests recovered per second
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Request budget settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub capacity: u32,
    pub padding: u32,
    pub leak_rate: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            capacity: 40,
            padding: 2,
            leak_rate: 2,
        }
    }
}

impl ThrottleConfig {
    pub const CAPACITY: FieldPath = FieldPath::new("throttle.capacity");
    pub const PADDING: FieldPath = FieldPath::new("throttle.padding");
    pub const LEAK_RATE: FieldPath = FieldPath::new("throttle.leak_rate");

    /// Maximum in-flight budget: `capacity - padding`, never below 1.
    pub fn bucket_limit(&self) -> u32 {
        self.capacity.saturating_sub(self.padding).max(1)
    }

    /// Tick period shared by the leak and drain cycles.
    pub fn period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.leak_rate.max(1)))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.capacity == 0 {
            diag.error(Self::CAPACITY, "capacity must be positive");
        }
        if self.padding >= self.capacity {
            diag.error_with_hint(
                Self::PADDING,
                "padding must be smaller than capacity",
                format!("capacity is {}", self.capacity),
            );
        }
        if self.leak_rate == 0 || self.leak_rate > 1000 {
            diag.error(Self::LEAK_RATE, "leak_rate must be between 1 and 1000");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_limit_and_period() {
        let throttle = ThrottleConfig::default();
        assert_eq!(throttle.bucket_limit(), 38);
        assert_eq!(throttle.period(), Duration::from_millis(500));

        let throttle = ThrottleConfig {
            capacity: 3,
            padding: 5,
            leak_rate: 4,
        };
        assert_eq!(throttle.bucket_limit(), 1);
        assert_eq!(throttle.period(), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_padding_over_capacity() {
        let mut diag = ConfigDiagnostics::new();
        ThrottleConfig {
            capacity: 2,
            padding: 2,
            leak_rate: 0,
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}

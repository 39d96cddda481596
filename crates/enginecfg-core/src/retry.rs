use std::time::Duration;

/// Bounded exponential backoff for transient (5xx/transport) failures.
///
/// Kept as an explicit policy value rather than inline constants so tests can
/// inject [`RetryPolicy::no_delay`] and run without sleeping.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget as the default policy, zero sleep between tries.
    pub fn no_delay() -> Self {
        Self {
            initial_delay_ms: 0,
            max_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Delay before the given retry; `attempt` is 1-based and names the
    /// attempt that just failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_progression() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(7), Duration::from_millis(10_000));
    }

    #[test]
    fn test_no_delay_policy_never_sleeps() {
        let policy = RetryPolicy::no_delay();
        assert_eq!(policy.max_attempts, RetryPolicy::default().max_attempts);
        for attempt in 1..=8 {
            assert_eq!(policy.delay_for(attempt), Duration::ZERO);
        }
    }
}

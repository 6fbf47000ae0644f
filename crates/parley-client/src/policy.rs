use std::time::Duration;

use parley_config::ReconnectConfig;

/// Exponential backoff: `min(base · 2^attempt, max)` for up to
/// `max_attempts` consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt + 1` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.enabled && attempts < self.max_attempts
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(c: &ReconnectConfig) -> Self {
        Self {
            enabled: c.enabled,
            base_delay: Duration::from_millis(c.base_delay_ms),
            max_delay: Duration::from_millis(c.max_delay_ms),
            max_attempts: c.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_from_base() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.delay_for(0), Duration::from_millis(1000));
        assert_eq!(p.delay_for(1), Duration::from_millis(2000));
        assert_eq!(p.delay_for(4), Duration::from_millis(16_000));
    }

    #[test]
    fn delay_is_capped() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(p.delay_for(60), Duration::from_millis(30_000));
    }

    #[test]
    fn retries_stop_at_max_attempts() {
        let p = ReconnectPolicy::default();
        assert!(p.should_retry(0));
        assert!(p.should_retry(4));
        assert!(!p.should_retry(5));
    }

    #[test]
    fn disabled_policy_never_retries() {
        let p = ReconnectPolicy { enabled: false, ..ReconnectPolicy::default() };
        assert!(!p.should_retry(0));
    }

    #[test]
    fn built_from_config() {
        let cfg = ReconnectConfig { enabled: true, base_delay_ms: 50, max_delay_ms: 400, max_attempts: 3 };
        let p = ReconnectPolicy::from(&cfg);
        assert_eq!(p.delay_for(0), Duration::from_millis(50));
        assert_eq!(p.delay_for(10), Duration::from_millis(400));
        assert_eq!(p.max_attempts, 3);
    }
}

//! Reconnect backoff policy.
//!
//! Pure functions over the attempt counter, so the schedule can be tested
//! without opening sockets.

use std::time::Duration;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Exponential backoff with a delay cap and a bounded attempt count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait before the given reconnect attempt (1-indexed)
    ///
    /// The delay doubles with each attempt and never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether another reconnect attempt is allowed after `attempts_made` failures
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_from_initial() {
        // テスト項目: 再接続の待機時間は初期値から倍々に増える
        // given (前提条件):
        let policy = BackoffPolicy::default();

        // when (操作):
        let delays: Vec<Duration> = (1..=4).map(|attempt| policy.delay_for(attempt)).collect();

        // then (期待する結果):
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[test]
    fn test_delay_is_capped() {
        // テスト項目: 待機時間は上限値を超えない
        // given (前提条件):
        let policy = BackoffPolicy::default();

        // when (操作):
        let fifth = policy.delay_for(5);
        let hundredth = policy.delay_for(100);

        // then (期待する結果):
        assert_eq!(fifth, Duration::from_secs(5));
        assert_eq!(hundredth, Duration::from_secs(5));
    }

    #[test]
    fn test_should_retry_within_limit() {
        // テスト項目: 試行回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let policy = BackoffPolicy::default();

        // when (操作):
        let first = policy.should_retry(0);
        let one_before_limit = policy.should_retry(9);

        // then (期待する結果):
        assert!(first);
        assert!(one_before_limit);
    }

    #[test]
    fn test_should_not_retry_at_limit() {
        // テスト項目: 試行回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let policy = BackoffPolicy {
            max_attempts: 3,
            ..BackoffPolicy::default()
        };

        // when (操作):
        let result = policy.should_retry(3);

        // then (期待する結果):
        assert!(!result);
    }
}

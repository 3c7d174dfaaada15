// AirQ Sim - Publish retry policy
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Retry policy for mid-run publish failures.
//!
//! The default is [`RetryStrategy::None`]: a failed publish is counted and
//! dropped, leaving the next tick to carry fresh values.

use std::time::Duration;

/// Upper bound on a single backoff pause.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// How often, and after which pause, a refused message is offered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Drop on the first failure.
    #[default]
    None,
    /// Same pause before every retry.
    Fixed { retries: u32, delay: Duration },
    /// Pause doubles after each retry, up to [`MAX_BACKOFF`].
    Doubling { retries: u32, first: Duration },
}

impl RetryStrategy {
    /// Constant pause between retries. Zero retries means [`RetryStrategy::None`].
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        match retries {
            0 => Self::None,
            retries => Self::Fixed { retries, delay },
        }
    }

    /// Doubling pause starting at `first`. Zero retries means [`RetryStrategy::None`].
    pub fn doubling(retries: u32, first: Duration) -> Self {
        match retries {
            0 => Self::None,
            retries => Self::Doubling { retries, first },
        }
    }

    /// Retries allowed after the first failed publish.
    pub fn retries(&self) -> u32 {
        match *self {
            Self::None => 0,
            Self::Fixed { retries, .. } | Self::Doubling { retries, .. } => retries,
        }
    }

    /// Pause before retry number `attempt` (0-based), or `None` once the
    /// message should be dropped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.retries() {
            return None;
        }
        match *self {
            Self::None => None,
            Self::Fixed { delay, .. } => Some(delay),
            Self::Doubling { first, .. } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                Some(first.saturating_mul(factor).min(MAX_BACKOFF))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_drops_immediately() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy, RetryStrategy::None);
        assert_eq!(strategy.delay_for_attempt(0), None);
        assert_eq!(strategy.retries(), 0);
    }

    #[test]
    fn test_fixed_pause() {
        let strategy = RetryStrategy::fixed(2, Duration::from_millis(50));
        assert_eq!(strategy.delay_for_attempt(0), Some(Duration::from_millis(50)));
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_millis(50)));
        assert_eq!(strategy.delay_for_attempt(2), None);
        assert_eq!(strategy.retries(), 2);
    }

    #[test]
    fn test_doubling_pause_is_capped() {
        let strategy = RetryStrategy::doubling(40, Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_millis(200)));
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_millis(800)));
        assert_eq!(strategy.delay_for_attempt(8), Some(MAX_BACKOFF));
        // Shift past the width of u32 saturates instead of wrapping.
        assert_eq!(strategy.delay_for_attempt(39), Some(MAX_BACKOFF));
        assert_eq!(strategy.delay_for_attempt(40), None);
    }

    #[test]
    fn test_zero_retries_is_none() {
        assert_eq!(
            RetryStrategy::fixed(0, Duration::from_millis(10)),
            RetryStrategy::None
        );
        assert_eq!(
            RetryStrategy::doubling(0, Duration::from_millis(10)),
            RetryStrategy::None
        );
    }
}

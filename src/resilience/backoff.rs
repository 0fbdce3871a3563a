//! Exponential backoff.

use std::time::Duration;

/// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`.
///
/// With a 2s base this yields 2s, 4s, 8s. No jitter.
pub fn calculate_backoff(retry: u32, base: Duration) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(retry - 1);
    base.saturating_mul(factor)
}

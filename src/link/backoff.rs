//! Reconnect backoff and wraparound-safe timestamp arithmetic.
//!
//! Timestamps come from a free-running 32-bit millisecond counter that wraps
//! after about 49 days. Two timestamps are ordered by assuming they are less
//! than half the counter range apart.

/// Returns `true` if `target` is later than `base`.
///
/// A difference larger than `u32::MAX / 2` is taken as a wrap of the counter,
/// which inverts the naive comparison.
pub fn is_later(base: u32, target: u32) -> bool {
    if base >= target {
        base - target > u32::MAX / 2
    } else {
        target - base <= u32::MAX / 2
    }
}

/// Milliseconds from `now` until `deadline`, or 0 if the deadline has passed.
pub fn remaining(now: u32, deadline: u32) -> u32 {
    if is_later(now, deadline) {
        deadline.wrapping_sub(now)
    } else {
        0
    }
}

/// Backoff before reconnect attempt number `retry`: `2^retry * min_backoff_ms`.
///
/// Saturates instead of overflowing for large exponents.
pub fn base_interval(retry: u8, min_backoff_ms: u32) -> u32 {
    1u32.checked_shl(retry as u32)
        .and_then(|factor| factor.checked_mul(min_backoff_ms))
        .unwrap_or(u32::MAX)
}

/// Adds up to 20 % of `base` scaled by `random / u32::MAX`.
pub fn jittered(base: u32, random: u32) -> u32 {
    let jitter = base as u64 * random as u64 / (u32::MAX as u64 * 5);
    base.saturating_add(jitter as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_without_wrap() {
        assert!(is_later(100, 200));
        assert!(!is_later(200, 100));
        assert!(!is_later(100, 100));
    }

    #[test]
    fn later_across_wrap() {
        let before_wrap = u32::MAX - 50;
        let after_wrap = 20;
        // Naively after_wrap < before_wrap.
        assert!(after_wrap < before_wrap);
        assert!(is_later(before_wrap, after_wrap));
        assert!(!is_later(after_wrap, before_wrap));
    }

    #[test]
    fn remaining_time() {
        assert_eq!(remaining(1000, 1500), 500);
        assert_eq!(remaining(1500, 1000), 0);
        assert_eq!(remaining(u32::MAX - 9, 10), 20);
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let mut previous = 0;
        for retry in 0..=8u8 {
            let interval = base_interval(retry, 1000);
            assert_eq!(interval, (1u32 << retry) * 1000);
            assert!(interval > previous);
            previous = interval;
        }
        assert_eq!(base_interval(8, 1000), 256_000);
        assert_eq!(base_interval(40, 1000), u32::MAX);
    }

    #[test]
    fn jitter_bounded_to_a_fifth() {
        assert_eq!(jittered(1000, 0), 1000);
        assert_eq!(jittered(1000, u32::MAX), 1200);
        let mid = jittered(1000, u32::MAX / 2);
        assert!(mid > 1000 && mid < 1200);
    }
}

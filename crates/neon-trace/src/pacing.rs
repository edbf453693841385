//! Minimum reveal time.
//!
//! A fast model reply must not cut the scan animation short, so results are
//! held back until a floor has elapsed since the request started. A slow
//! reply is revealed as soon as it lands.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Time still to wait before revealing: `max(0, floor - elapsed)`.
pub fn reveal_delay(floor: Duration, elapsed: Duration) -> Duration {
    floor.saturating_sub(elapsed)
}

/// Await `fut`, then sleep out whatever remains of `floor`.
///
/// The clock starts on first poll. Errors are held back the same as
/// successes.
pub async fn with_floor<F: Future>(floor: Duration, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    let remaining = reveal_delay(floor, started.elapsed());
    if !remaining.is_zero() {
        tokio::time::sleep(remaining).await;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_remainder_of_floor() {
        let floor = Duration::from_secs(12);
        assert_eq!(
            reveal_delay(floor, Duration::from_secs(5)),
            Duration::from_secs(7)
        );
        assert_eq!(reveal_delay(floor, floor), Duration::ZERO);
        assert_eq!(
            reveal_delay(floor, Duration::from_secs(30)),
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn fast_future_waits_for_floor() {
        let started = Instant::now();
        let value = with_floor(Duration::from_millis(60), async { 7 }).await;
        assert_eq!(value, 7);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn slow_future_is_not_delayed_further() {
        let started = Instant::now();
        let value = with_floor(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            "late"
        })
        .await;
        assert_eq!(value, "late");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(80));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn zero_floor_returns_immediately() {
        let result: Result<(), String> =
            with_floor(Duration::ZERO, async { Err("boom".to_string()) }).await;
        assert_eq!(result.unwrap_err(), "boom");
    }
}

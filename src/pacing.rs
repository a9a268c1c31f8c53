//! Randomized inter-iteration pacing.

use rand::Rng;
use std::time::Duration;

/// Smallest usable mean delay; keeps the exponential rate finite when the
/// configured mean is zero.
pub const MIN_MEAN_DELAY: Duration = Duration::from_millis(1);

/// Draw a delay from an exponential distribution with the given mean.
///
/// Inverse-CDF sampling over a uniform variate; the mean is floored at
/// [`MIN_MEAN_DELAY`].
pub fn exponential_delay(mean: Duration) -> Duration {
    let mean_secs = mean.as_secs_f64().max(MIN_MEAN_DELAY.as_secs_f64());
    let u: f64 = rand::rng().random();
    Duration::from_secs_f64(-mean_secs * (1.0 - u).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_finite_and_non_negative() {
        for _ in 0..10_000 {
            let delay = exponential_delay(Duration::from_millis(10));
            assert!(delay < Duration::from_secs(60));
        }
    }

    #[test]
    fn test_zero_mean_is_floored() {
        for _ in 0..1_000 {
            let delay = exponential_delay(Duration::ZERO);
            // Mean is floored at 1ms; an exponential sample beyond 1000x
            // the mean has negligible probability.
            assert!(delay < Duration::from_secs(1));
        }
    }

    #[test]
    fn test_sample_mean_tracks_configured_mean() {
        let mean = Duration::from_millis(10);
        let samples = 20_000;
        let total: f64 = (0..samples)
            .map(|_| exponential_delay(mean).as_secs_f64())
            .sum();
        let sample_mean = total / samples as f64;

        // Loose statistical bounds: well within a few standard errors.
        assert!(sample_mean > 0.005, "sample mean {sample_mean} too small");
        assert!(sample_mean < 0.015, "sample mean {sample_mean} too large");
    }
}

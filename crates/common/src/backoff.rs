use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter between retry attempts.
///
/// Formula: min(max_delay, base * 2^attempt) +/- jitter, never below an
/// optional server-provided floor.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.2,
            attempt: 0,
        }
    }
}

impl ExponentialBackoff {
    /// Create a new ExponentialBackoff.
    ///
    /// # Arguments
    /// * `base` - Initial delay duration
    /// * `max_delay` - Maximum delay cap
    /// * `jitter_factor` - Jitter as a fraction of delay (0.0 to 1.0). Out of range values are clamped.
    pub fn new(base: Duration, max_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max_delay,
            // Clamp to keep gen_range bounds valid
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    /// Calculate the next delay and increment the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exp_delay = self.base.saturating_mul(2u32.saturating_pow(self.attempt));
        let capped_delay = exp_delay.min(self.max_delay);

        let jitter_range = capped_delay.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let final_secs = (capped_delay.as_secs_f64() + jitter).max(0.0);

        self.attempt = self.attempt.saturating_add(1);

        Duration::from_secs_f64(final_secs)
    }

    /// Next delay, but never shorter than `floor` (e.g. a `Retry-After` hint).
    pub fn next_delay_at_least(&mut self, floor: Option<Duration>) -> Duration {
        let delay = self.next_delay();
        floor.map_or(delay, |f| delay.max(f))
    }

    /// Reset the attempt counter.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Get current attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_increases_exponentially() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(60), 0.0);

        let delays: Vec<_> = (0..4).map(|_| backoff.next_delay()).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(10), 0.0);

        for _ in 0..10 {
            backoff.next_delay();
        }

        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_reset() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 0.0);

        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_with_jitter_stays_in_bounds() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.2);

        let secs = backoff.next_delay().as_secs_f64();

        assert!((8.0..=12.0).contains(&secs), "delay was {}", secs);
    }

    #[test]
    fn test_backoff_honors_floor() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(60), 0.0);

        let delay = backoff.next_delay_at_least(Some(Duration::from_secs(2)));
        assert_eq!(delay, Duration::from_secs(2));

        let delay = backoff.next_delay_at_least(None);
        assert_eq!(delay, Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_negative_jitter_clamped() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), -0.5);

        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}

//! Request-weight budgets per rate-limit bucket.
//!
//! Binance counts request *weight* against fixed one-minute windows, with
//! separate budgets for `/api`, `/sapi` and `/fapi`. [`RateLimiter::admit`]
//! reserves weight before a request is sent and suspends the caller until the
//! window rolls over when the budget is exhausted. Calls are delayed, never
//! rejected.

use crate::error::ApiError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A separately budgeted group of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateBucket {
    /// `/api/v3/*` request weight per IP.
    SpotGeneral,
    /// `/sapi/*` IP weight.
    SapiIp,
    /// `/fapi/*` request weight per IP.
    FuturesGeneral,
    /// Website endpoints, which publish no budget.
    Web,
}

impl RateBucket {
    pub const ALL: [RateBucket; 4] = [
        RateBucket::SpotGeneral,
        RateBucket::SapiIp,
        RateBucket::FuturesGeneral,
        RateBucket::Web,
    ];

    /// Response header reporting weight used in the current minute.
    pub fn used_weight_header(&self) -> Option<&'static str> {
        match self {
            Self::SpotGeneral | Self::FuturesGeneral => Some("x-mbx-used-weight-1m"),
            Self::SapiIp => Some("x-sapi-used-ip-weight-1m"),
            Self::Web => None,
        }
    }
}

/// Weight limits per window.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub spot_general: u32,
    pub sapi_ip: u32,
    pub futures_general: u32,
    pub web: u32,
    pub window: Duration,
}

impl Default for RateLimits {
    /// Published Binance limits.
    fn default() -> Self {
        Self {
            spot_general: 6_000,
            sapi_ip: 12_000,
            futures_general: 2_400,
            web: 60,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimits {
    pub fn limit_for(&self, bucket: RateBucket) -> u32 {
        match bucket {
            RateBucket::SpotGeneral => self.spot_general,
            RateBucket::SapiIp => self.sapi_ip,
            RateBucket::FuturesGeneral => self.futures_general,
            RateBucket::Web => self.web,
        }
    }
}

#[derive(Debug)]
struct RateBudget {
    window_start: Instant,
    consumed: u32,
    limit: u32,
}

impl RateBudget {
    fn roll_window(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.consumed = 0;
        }
    }
}

/// Fixed-window weight limiter shared by every request path.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    budgets: HashMap<RateBucket, Mutex<RateBudget>>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        let now = Instant::now();
        let budgets = RateBucket::ALL
            .iter()
            .map(|&bucket| {
                let budget = RateBudget {
                    window_start: now,
                    consumed: 0,
                    limit: limits.limit_for(bucket),
                };
                (bucket, Mutex::new(budget))
            })
            .collect();

        Self {
            window: limits.window,
            budgets,
        }
    }

    fn budget(&self, bucket: RateBucket) -> &Mutex<RateBudget> {
        // Every bucket is inserted in `new`
        &self.budgets[&bucket]
    }

    /// Reserve `weight` in `bucket`, waiting for the next window if needed.
    ///
    /// Returns how long the caller was suspended.
    ///
    /// # Errors
    /// `ConfigError` if `weight` alone exceeds the bucket limit; such a call
    /// could never be admitted.
    pub async fn admit(&self, bucket: RateBucket, weight: u32) -> Result<Duration, ApiError> {
        let started = Instant::now();

        loop {
            let wait = {
                let mut budget = self.budget(bucket).lock();
                if weight > budget.limit {
                    return Err(ApiError::config(format!(
                        "weight {} exceeds the {:?} limit of {}",
                        weight, bucket, budget.limit
                    )));
                }

                let now = Instant::now();
                budget.roll_window(now, self.window);

                if budget.consumed + weight <= budget.limit {
                    budget.consumed += weight;
                    return Ok(now.duration_since(started));
                }

                self.window
                    .saturating_sub(now.duration_since(budget.window_start))
            };

            tracing::debug!(
                bucket = ?bucket,
                weight,
                wait_ms = wait.as_millis() as u64,
                "Rate budget exhausted, waiting for next window"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Reconcile with the weight the exchange reports as used.
    ///
    /// Only raises the local count; other clients sharing the IP may have
    /// spent weight we did not see.
    pub fn observe_used_weight(&self, bucket: RateBucket, used: u32) {
        let mut budget = self.budget(bucket).lock();
        budget.roll_window(Instant::now(), self.window);
        let used = used.min(budget.limit);
        if used > budget.consumed {
            budget.consumed = used;
        }
    }

    /// Weight consumed in the current window and the limit.
    pub fn usage(&self, bucket: RateBucket) -> (u32, u32) {
        let mut budget = self.budget(bucket).lock();
        budget.roll_window(Instant::now(), self.window);
        (budget.consumed, budget.limit)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

use axum::http::HeaderMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::warn;

use crate::error::AmurexError;

pub type GenerateLimiter = DefaultKeyedRateLimiter<String>;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// `limit` requests per client per day, replenished evenly. `None` when disabled.
pub fn daily_limiter(limit: u32) -> Option<GenerateLimiter> {
    let burst = NonZeroU32::new(limit)?;
    let quota = Quota::with_period(DAY / limit)?.allow_burst(burst);
    Some(RateLimiter::keyed(quota))
}

/// First hop of `x-forwarded-for`, else `x-real-ip`, else a shared bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .unwrap_or_else(|| "anonymous".to_string())
}

pub fn check_quota(limiter: Option<&GenerateLimiter>, headers: &HeaderMap) -> Result<(), AmurexError> {
    let Some(limiter) = limiter else {
        return Ok(());
    };
    let key = client_key(headers);
    let outcome = limiter.check_key(&key);
    if limiter.len() > MAX_TRACKED_CLIENTS {
        limiter.retain_recent();
    }
    outcome.map_err(|_| {
        warn!(client = %key, "generate quota exhausted");
        AmurexError::RateLimited
    })
}

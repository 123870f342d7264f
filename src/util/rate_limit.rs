//! Rate limiting utilities

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// One independent budget per key (a match id, or the shared creation bucket)
pub type Limiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Create a keyed rate limiter allowing the specified requests per second per key
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Forget keys whose budget has fully refilled. Returns how many keys remain.
pub fn prune(limiter: &Limiter) -> usize {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    limiter.len()
}

//! Rate limiting and quota tracking for external API calls.

mod clock;
mod rate_limiter;

pub use clock::{Clock, ManualClock, TokioClock};
pub use rate_limiter::{QuotaLimits, QuotaState, RateLimiter, MINUTE};

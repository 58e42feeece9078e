//! Client-side flow control scenarios
//!
//! - Quotas: a burst of unbatched sends, tolerating broker throttling
//! - Rate limiting: paced batches with explicit flushes

mod quotas;
mod rate_limiting;

pub use quotas::{is_throttle_error, test_quotas};
pub use rate_limiting::test_rate_limiting;

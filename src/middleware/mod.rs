//! Session middleware
//!
//! Provides connection logging and per-client rate limiting.

pub mod logging;
pub mod rate_limit;

pub use rate_limit::RateLimiter;

//! Test synthesizer collaborator over HTTP
//!
//! - JSON request/response client with bearer authentication
//! - Token bucket rate limiting
//! - Explicit per-request timeout, no retries

pub mod client;
pub mod rate_limiter;

pub use client::HttpTestSynthesizer;
pub use rate_limiter::TokenBucketRateLimiter;

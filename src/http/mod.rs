//! HTTP client layer: `GiveawayHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

pub use client::GiveawayHttp;
pub use retry::{RetryConfig, RetryPolicy};

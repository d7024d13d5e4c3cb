//! Core abstractions shared by the advisor-rs crates
//!
//! This crate holds the pieces every other crate needs: the common
//! [`Error`]/[`Result`] pair and the [`RetryPolicy`] that both the market
//! gateway and the decision client use for their outbound calls.

pub mod error;
pub mod retry;

pub use error::{Error, Result};
pub use retry::{RetryDirective, RetryPolicy};

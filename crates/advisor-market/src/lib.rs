//! Market-data gateway for advisor-rs
//!
//! Every upstream market-data call in the system goes through
//! [`MarketGateway`]: it checks the TTL cache first, spaces outbound
//! requests behind a process-wide rate limiter with jitter, retries
//! transient failures with exponential backoff (and an extended wait on
//! upstream rate limits), and classifies failures into the typed
//! [`MarketError`] taxonomy. No other component performs upstream I/O.
//!
//! The upstream service itself sits behind the [`MarketDataSource`] trait;
//! the shipped implementation is a Yahoo Finance client that normalizes
//! raw responses into the payload model in [`model`]. Tests inject fake
//! sources and fresh gateway instances instead of resetting globals.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod model;
pub mod source;
pub mod yahoo;

pub use cache::{CacheEntryStats, CacheKey, CacheStats, MarketCache};
pub use error::{MarketError, Result};
pub use gateway::{GatewayConfig, MarketGateway};
pub use model::{
    AnalystConsensus, CompanyProfile, FinancialStatement, PriceHistory, PricePoint, QuarterPoint,
    QuarterlySeries,
};
pub use source::{MarketDataSource, Operation, Timeframe};
pub use yahoo::YahooFinanceSource;

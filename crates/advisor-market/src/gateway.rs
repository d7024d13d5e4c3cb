//! The upstream gateway: cache, rate limiting, and retries
//!
//! All upstream market-data traffic funnels through one [`MarketGateway`]
//! per process. Concurrent analysis sessions share its cache and its rate
//! limiter; everything else about a session is private to that session.

use crate::cache::{CacheKey, CacheStats, MarketCache};
use crate::error::{MarketError, Result};
use crate::model::{
    AnalystConsensus, CompanyProfile, FinancialStatement, PriceHistory, QuarterlySeries,
};
use crate::source::{MarketDataSource, Operation, Timeframe};
use advisor_core::{RetryDirective, RetryPolicy};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Jitter, Quota, RateLimiter};
use rand::Rng;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Cache TTL for fetched payloads
    pub cache_ttl: Duration,

    /// Maximum number of cached payloads
    pub cache_capacity: usize,

    /// Minimum spacing between consecutive upstream calls, process-wide
    pub min_request_interval: Duration,

    /// Lower bound of the jitter added to each rate-limiter wait
    pub jitter_min: Duration,

    /// Width of the jitter interval (wait is stretched by
    /// `jitter_min..=jitter_min + jitter_interval`)
    pub jitter_interval: Duration,

    /// Maximum number of attempts per fetch
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts
    pub retry_backoff_base: Duration,

    /// Wait range applied after an upstream rate-limit signal, overriding
    /// the standard backoff schedule
    pub rate_limit_backoff: (Duration, Duration),

    /// Timeout for each upstream call
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
            min_request_interval: Duration::from_secs(1),
            jitter_min: Duration::from_millis(200),
            jitter_interval: Duration::from_millis(600),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(2),
            rate_limit_backoff: (Duration::from_secs(3), Duration::from_secs(8)),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Gateway in front of the upstream market-data source
///
/// Owns the only cache and the only rate limiter in the process; inject a
/// fresh instance per test instead of resetting shared globals.
pub struct MarketGateway {
    source: Arc<dyn MarketDataSource>,
    cache: MarketCache,
    limiter: SharedRateLimiter,
    jitter: Jitter,
    retry: RetryPolicy,
    config: GatewayConfig,
}

impl MarketGateway {
    /// Create a new gateway over the given source
    pub fn new(source: Arc<dyn MarketDataSource>, config: GatewayConfig) -> Self {
        let period = if config.min_request_interval.is_zero() {
            Duration::from_millis(1)
        } else {
            config.min_request_interval
        };
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        let jitter = Jitter::new(config.jitter_min, config.jitter_interval);
        let retry = RetryPolicy::new(
            config.max_retries.max(1),
            config.retry_backoff_base,
            Duration::from_secs(60),
            2.0,
        );

        Self {
            source,
            cache: MarketCache::new(config.cache_ttl, config.cache_capacity),
            limiter,
            jitter,
            retry,
            config,
        }
    }

    /// Fetch one operation's payload for a symbol
    ///
    /// Serves from cache when a non-expired entry exists; otherwise issues
    /// a rate-limited, retried upstream call and caches the result.
    pub async fn fetch(&self, symbol: &str, operation: Operation) -> Result<Value> {
        let symbol = symbol.to_uppercase();
        let key = CacheKey::new(&symbol, operation);

        if let Some(value) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }
        debug!("Cache miss for {}", key);

        let classify = |error: &MarketError| {
            if !error.is_retryable() {
                return RetryDirective::Halt;
            }
            if error.is_rate_limit() {
                let (min, max) = self.config.rate_limit_backoff;
                let wait = rand::thread_rng().gen_range(min..=max);
                return RetryDirective::BackoffFor(wait);
            }
            RetryDirective::Backoff
        };

        let value = self
            .retry
            .execute(operation.as_str(), classify, || {
                self.request(&symbol, operation)
            })
            .await
            .inspect_err(|e| warn!("Upstream fetch failed for {}: {}", key, e))?;

        info!("Fetched {} from upstream", key);
        self.cache.insert(key, value.clone()).await;
        Ok(value)
    }

    /// One upstream attempt: rate-limiter wait, then bounded call
    async fn request(&self, symbol: &str, operation: Operation) -> Result<Value> {
        self.limiter.until_ready_with_jitter(self.jitter).await;

        match tokio::time::timeout(
            self.config.request_timeout,
            self.source.fetch(symbol, operation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MarketError::Transient(format!(
                "{} for {symbol} timed out after {:?}",
                operation, self.config.request_timeout
            ))),
        }
    }

    /// Fetch and deserialize the company profile
    pub async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let value = self.fetch(symbol, Operation::CompanyProfile).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch and deserialize one annual statement
    pub async fn statement(&self, symbol: &str, operation: Operation) -> Result<FinancialStatement> {
        let value = self.fetch(symbol, operation).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch and deserialize one quarterly series
    pub async fn quarterly(&self, symbol: &str, operation: Operation) -> Result<QuarterlySeries> {
        let value = self.fetch(symbol, operation).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch the merged quarterly series (income + cash flow + balance sheet)
    pub async fn merged_quarterly(&self, symbol: &str) -> Result<QuarterlySeries> {
        let income = self.quarterly(symbol, Operation::QuarterlyIncome).await?;
        let cash_flow = self
            .quarterly(symbol, Operation::QuarterlyCashFlow)
            .await
            .unwrap_or_default();
        let balance = self
            .quarterly(symbol, Operation::QuarterlyBalanceSheet)
            .await
            .unwrap_or_default();
        Ok(QuarterlySeries::merge(income, cash_flow, balance))
    }

    /// Fetch and deserialize the analyst consensus
    pub async fn consensus(&self, symbol: &str) -> Result<AnalystConsensus> {
        let value = self.fetch(symbol, Operation::AnalystConsensus).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch and deserialize price history for a timeframe
    pub async fn price_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<PriceHistory> {
        let value = self
            .fetch(symbol, Operation::PriceHistory(timeframe))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Cache occupancy and expiry report for the admin surface
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Drop all cached payloads, returning how many were removed
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        info!("Cache cleared - removed {} items", removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    /// Test double that counts upstream calls and can fail on a schedule
    struct FakeSource {
        calls: AtomicU32,
        fail_first: u32,
        error: fn(&str) -> MarketError,
    }

    impl FakeSource {
        fn ok() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first: 0,
                error: |_| MarketError::Transient("unused".to_string()),
            }
        }

        fn failing(fail_first: u32, error: fn(&str) -> MarketError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
                error,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch(&self, symbol: &str, operation: Operation) -> Result<Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err((self.error)(symbol));
            }
            Ok(json!({"symbol": symbol, "operation": operation.as_str(), "call": n}))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn fast_config() -> GatewayConfig {
        GatewayConfig {
            min_request_interval: Duration::from_millis(1),
            jitter_min: Duration::ZERO,
            jitter_interval: Duration::from_millis(1),
            retry_backoff_base: Duration::from_millis(2),
            rate_limit_backoff: (Duration::from_millis(2), Duration::from_millis(5)),
            request_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_hits_cache() {
        let source = Arc::new(FakeSource::ok());
        let gateway = MarketGateway::new(source.clone(), fast_config());

        let first = gateway.fetch("AAPL", Operation::CompanyProfile).await.unwrap();
        let second = gateway.fetch("aapl", Operation::CompanyProfile).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_operations_fetch_separately() {
        let source = Arc::new(FakeSource::ok());
        let gateway = MarketGateway::new(source.clone(), fast_config());

        gateway.fetch("AAPL", Operation::CompanyProfile).await.unwrap();
        gateway.fetch("AAPL", Operation::QuarterlyIncome).await.unwrap();
        gateway.fetch("AAPL", Operation::CompanyProfile).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let source = Arc::new(FakeSource::failing(u32::MAX, |s| {
            MarketError::NotFound(s.to_string())
        }));
        let gateway = MarketGateway::new(source.clone(), fast_config());

        let err = gateway
            .fetch("ZZZZZZ", Operation::CompanyProfile)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let source = Arc::new(FakeSource::failing(2, |_| {
            MarketError::Transient("flaky".to_string())
        }));
        let gateway = MarketGateway::new(source.clone(), fast_config());

        let value = gateway.fetch("AAPL", Operation::CashFlow).await.unwrap();
        assert_eq!(value["call"], 3);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_failures_use_extended_backoff() {
        let source = Arc::new(FakeSource::failing(1, |_| {
            MarketError::RateLimited("429".to_string())
        }));
        let mut config = fast_config();
        config.rate_limit_backoff = (Duration::from_millis(30), Duration::from_millis(40));
        // Standard schedule would retry almost immediately
        config.retry_backoff_base = Duration::from_millis(1);
        let gateway = MarketGateway::new(source.clone(), config);

        let start = Instant::now();
        gateway.fetch("AAPL", Operation::BalanceSheet).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_retries_exhausted_surfaces_last_error() {
        let source = Arc::new(FakeSource::failing(u32::MAX, |_| {
            MarketError::Transient("down".to_string())
        }));
        let gateway = MarketGateway::new(source.clone(), fast_config());

        let err = gateway.fetch("AAPL", Operation::CashFlow).await.unwrap_err();
        assert!(matches!(err, MarketError::Transient(_)));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_upstream_calls() {
        let source = Arc::new(FakeSource::ok());
        let mut config = fast_config();
        config.min_request_interval = Duration::from_millis(50);
        let gateway = MarketGateway::new(source.clone(), config);

        let start = Instant::now();
        gateway.fetch("A", Operation::CompanyProfile).await.unwrap();
        gateway.fetch("B", Operation::CompanyProfile).await.unwrap();
        gateway.fetch("C", Operation::CompanyProfile).await.unwrap();

        assert_eq!(source.calls(), 3);
        // Three calls need at least two full spacing intervals
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_cache_stats_and_clear() {
        let source = Arc::new(FakeSource::ok());
        let gateway = MarketGateway::new(source, fast_config());

        gateway.fetch("AAPL", Operation::CompanyProfile).await.unwrap();
        gateway.fetch("MSFT", Operation::CompanyProfile).await.unwrap();

        let stats = gateway.cache_stats().await;
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 1000);

        assert_eq!(gateway.clear_cache().await, 2);
        assert_eq!(gateway.cache_stats().await.size, 0);
    }
}

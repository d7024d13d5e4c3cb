//! Retrying decision client
//!
//! Wraps any [`DecisionProvider`] with the shared retry/backoff
//! discipline. Rate-limit responses that carry a machine-suggested wait
//! are honored verbatim; without one, a default delay is used and doubled
//! on each subsequent rate-limited retry.

use crate::{DecisionProvider, DecisionRequest, DecisionResponse, LLMError, Result};
use advisor_core::{RetryDirective, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Decision client with retry handling
pub struct DecisionClient {
    provider: Arc<dyn DecisionProvider>,
    retry: RetryPolicy,
    default_rate_limit_delay: Duration,
}

impl DecisionClient {
    /// Create a new decision client
    pub fn new(provider: Arc<dyn DecisionProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            default_rate_limit_delay: Duration::from_secs(2),
        }
    }

    /// Override the default wait used for rate limits without a suggested delay
    pub fn with_default_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.default_rate_limit_delay = delay;
        self
    }

    /// Name of the wrapped provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one decision round with retries
    ///
    /// The client never caches: each attempt sends the request's full
    /// conversation state as given.
    pub async fn decide(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        let mut next_rate_limit_delay = self.default_rate_limit_delay;

        let classify = |error: &LLMError| {
            if !error.is_retryable() {
                return RetryDirective::Halt;
            }
            match error {
                LLMError::RateLimited { retry_after, .. } => {
                    let wait = match retry_after {
                        Some(suggested) => *suggested,
                        None => {
                            let delay = next_rate_limit_delay;
                            next_rate_limit_delay *= 2;
                            delay
                        }
                    };
                    debug!("Decision model rate limited, waiting {:?}", wait);
                    RetryDirective::BackoffFor(wait)
                }
                _ => RetryDirective::Backoff,
            }
        };

        self.retry
            .execute("decision", classify, || {
                self.provider.decide(request.clone())
            })
            .await
    }
}
